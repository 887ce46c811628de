//! Resolved locations and store handles for one invocation.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::config::Config;
use crate::core::domain::PublicKeyRecord;
use crate::core::history::GitStore;
use crate::core::keyring::{find_key, AgeKeyring, Keyring};
use crate::core::store::PasswordStore;
use crate::core::types::Fingerprint;
use crate::error::{KeyringError, Result};

/// The store type every command works on.
pub type Store = PasswordStore<AgeKeyring, GitStore>;

pub struct Session {
    pub config: Config,
    pub store_dir: PathBuf,
    pub keyring_dir: PathBuf,
}

impl Session {
    /// Load config and resolve directories. Flags win over the config file.
    pub fn new(store: Option<&Path>, keyring: Option<&Path>) -> Result<Self> {
        let config = Config::load()?;
        let store_dir = config.store_dir(store)?;
        let keyring_dir = config.keyring_dir(keyring)?;
        debug!(
            store = %store_dir.display(),
            keyring = %keyring_dir.display(),
            "session"
        );
        Ok(Self {
            config,
            store_dir,
            keyring_dir,
        })
    }

    pub fn keyring(&self) -> Result<AgeKeyring> {
        AgeKeyring::open(&self.keyring_dir)
    }

    /// Open the store for an existing repository.
    pub fn open(&self) -> Result<Store> {
        let git = GitStore::open(&self.store_dir)?.with_author(self.config.author());
        PasswordStore::open(self.keyring()?, git)
    }

    /// Create the repository if needed and declare the root recipients.
    pub fn init(&self, fingerprints: &[Fingerprint]) -> Result<Store> {
        let git = GitStore::init(&self.store_dir)?.with_author(self.config.author());
        PasswordStore::init(self.keyring()?, git, fingerprints)
    }

    /// The flag if given, else the configured budget.
    pub fn skip_budget(&self, flag: Option<usize>) -> usize {
        flag.unwrap_or(self.config.reinit.skip_budget)
    }
}

/// Resolve a key id, fingerprint or email to a fingerprint.
///
/// A full 40-digit fingerprint is accepted even when the keyring does not
/// know it, so stale recipients can still be removed.
pub fn resolve_key<K: Keyring + ?Sized>(keyring: &K, query: &str) -> Result<Fingerprint> {
    let keys = keyring.list_keys()?;
    if let Some(key) = find_key(&keys, query) {
        return Ok(key.fingerprint.clone());
    }
    let query = query.trim();
    if query.len() == 40 && query.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(query.to_ascii_uppercase());
    }
    Err(KeyringError::KeyNotFound(query.to_string()).into())
}

/// Resolve to a known key record, including unusable ones.
pub fn lookup_key<K: Keyring + ?Sized>(keyring: &K, query: &str) -> Result<PublicKeyRecord> {
    keyring
        .list_keys()?
        .into_iter()
        .find(|k| k.matches(query))
        .ok_or_else(|| KeyringError::KeyNotFound(query.to_string()).into())
}
