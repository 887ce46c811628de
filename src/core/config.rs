//! Configuration file management.
//!
//! Reads `~/.cellar/config.toml` (or `$CELLAR_CONFIG`). A
//! missing file yields defaults; command-line flags and environment
//! variables override what the file says.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::core::history::Author;
use crate::error::{ConfigError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub keyring: KeyringConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub reinit: ReinitConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store directory, `~/.cellar/store` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// `[keyring]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyringConfig {
    /// Keyring directory, `~/.cellar/keyring` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// `[git]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

/// `[reinit]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReinitConfig {
    /// Decrypt failures tolerated by bulk operations.
    #[serde(default)]
    pub skip_budget: usize,
}

impl Config {
    /// Base directory (`~/.cellar`).
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(constants::BASE_DIR))
    }

    /// Config file location, honoring `$CELLAR_CONFIG`.
    pub fn config_path() -> Result<PathBuf> {
        match std::env::var_os(constants::ENV_CONFIG) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(Self::base_dir()?.join(constants::CONFIG_FILE)),
        }
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` if the TOML is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        if !path.exists() {
            debug!("no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        config.validate()?;

        debug!(
            store = ?config.store.dir,
            keyring = ?config.keyring.dir,
            skip_budget = config.reinit.skip_budget,
            "config loaded"
        );
        Ok(config)
    }

    /// Check values that deserialize but make no sense.
    pub fn validate(&self) -> Result<()> {
        for (field, dir) in [("store.dir", &self.store.dir), ("keyring.dir", &self.keyring.dir)] {
            if dir.as_ref().is_some_and(|d| d.as_os_str().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "empty path".to_string(),
                }
                .into());
            }
        }
        if self.git.author_email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(ConfigError::InvalidValue {
                field: "git.author_email",
                reason: "not an email address".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Store directory: override, then config, then default.
    pub fn store_dir(&self, flag: Option<&Path>) -> Result<PathBuf> {
        resolve_dir(flag, constants::ENV_STORE, self.store.dir.as_deref(), "store")
    }

    /// Keyring directory: override, then config, then default.
    pub fn keyring_dir(&self, flag: Option<&Path>) -> Result<PathBuf> {
        resolve_dir(flag, constants::ENV_KEYRING, self.keyring.dir.as_deref(), "keyring")
    }

    /// Commit author, falling back to the OS user for unset parts.
    pub fn author(&self) -> Author {
        let mut author = Author::current();
        if let Some(name) = &self.git.author_name {
            author.name = name.clone();
        }
        if let Some(email) = &self.git.author_email {
            author.email = email.clone();
        }
        author
    }
}

fn resolve_dir(
    flag: Option<&Path>,
    env: &str,
    configured: Option<&Path>,
    default: &str,
) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os(env).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = configured {
        return Ok(dir.to_path_buf());
    }
    Ok(Config::base_dir()?.join(default))
}
