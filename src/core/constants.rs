//! Constants used throughout cellar.
//!
//! Centralizes file names, environment variables and defaults.

/// Suffix appended to a logical secret path on disk.
pub const SUFFIX: &str = ".age";

/// Trust-domain marker file name.
pub const MARKER: &str = ".age-id";

/// Directory names that never hold secrets.
pub const RESERVED_COMPONENTS: &[&str] = &[".git", MARKER];

/// Default file mode for new secret files.
pub const DEFAULT_MODE: u32 = 0o644;

/// Mode for private key files.
pub const PRIVATE_KEY_MODE: u32 = 0o600;

/// Base directory relative to HOME (~/.cellar).
pub const BASE_DIR: &str = ".cellar";

/// Config file name inside the base directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Public keyring file inside the keyring directory.
pub const PUBRING_FILE: &str = "pubring.toml";

/// Private key directory inside the keyring directory.
pub const PRIVATE_DIR: &str = "private";

/// Overrides the config file location.
pub const ENV_CONFIG: &str = "CELLAR_CONFIG";

/// Overrides the store directory.
pub const ENV_STORE: &str = "CELLAR_STORE";

/// Overrides the keyring directory.
pub const ENV_KEYRING: &str = "CELLAR_KEYRING";

/// Log filter variable.
pub const ENV_LOG: &str = "CELLAR_LOG";

/// Largest accepted protocol frame (64 MiB).
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;
