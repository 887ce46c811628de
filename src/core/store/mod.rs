//! The password store.
//!
//! [`PasswordStore`] ties a [`Keyring`] and a [`VersionedStore`] together
//! under the trust domains declared in the tree. Every mutating operation
//! stages its changes inside one [`Transaction`] and commits once; a
//! failure anywhere before the commit drops the guard and nothing staged
//! becomes visible.
//!
//! [`Transaction`]: crate::core::history::Transaction

mod import;
mod recipients;
mod scan;
mod secrets;

pub use import::{ImportOptions, ImportReport};
pub use recipients::{ReinitReport, Skipped};
pub use scan::{Mismatch, ScanReport, SearchMatch, SearchReport};

use tracing::{debug, info, warn};

use crate::core::constants::DEFAULT_MODE;
use crate::core::history::{Transaction, VersionedStore};
use crate::core::keyring::Keyring;
use crate::core::path::{self, ROOT};
use crate::core::trust::{self, TrustDomains};
use crate::core::types::Fingerprint;
use crate::error::{KeyringError, Result, StoreError, ValidationError};

/// Encrypted secret tree with per-directory recipients.
pub struct PasswordStore<K: Keyring, S: VersionedStore> {
    keyring: K,
    store: S,
    domains: TrustDomains,
}

impl<K: Keyring, S: VersionedStore> PasswordStore<K, S> {
    /// Declare the root trust domain in an empty store and open it.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` when the root marker exists
    /// - `InvalidArgument` for an empty recipient set
    /// - `EncryptionFailed` when a recipient is unknown or unusable
    pub fn init(keyring: K, mut store: S, fingerprints: &[Fingerprint]) -> Result<Self> {
        let marker = path::marker_file(ROOT);
        if store.list_paths()?.contains(&marker) {
            return Err(StoreError::AlreadyTracked(marker).into());
        }

        let recipients = usable_recipients(&keyring, fingerprints)?;
        let (marker, contents) = trust::declare_domain(ROOT, &recipients);
        let mut tx = Transaction::begin(&mut store);
        tx.stage_create(&marker, contents, DEFAULT_MODE)?;
        tx.commit(&format!(
            "initialized store with recipients [{}]",
            recipients.join(", ")
        ))?;

        info!(recipients = recipients.len(), "store initialized");
        Self::open(keyring, store)
    }

    /// Open an initialized store.
    ///
    /// # Errors
    ///
    /// `MissingDefaultDomain` when the root marker is absent.
    pub fn open(keyring: K, store: S) -> Result<Self> {
        let domains = TrustDomains::load(&store)?;

        let known: Vec<Fingerprint> = keyring
            .list_keys()?
            .into_iter()
            .map(|k| k.fingerprint)
            .collect();
        for (dir, fingerprints) in domains.iter() {
            let missing: Vec<&str> = fingerprints
                .iter()
                .filter(|f| !known.contains(f))
                .map(String::as_str)
                .collect();
            if !missing.is_empty() {
                warn!(dir, missing = ?missing, "trust domain names keys missing from the keyring");
            }
        }

        debug!(domains = domains.iter().count(), "store opened");
        Ok(Self {
            keyring,
            store,
            domains,
        })
    }

    pub fn keyring(&self) -> &K {
        &self.keyring
    }

    /// Mutable keyring access. Trust domains are unaffected.
    pub fn keyring_mut(&mut self) -> &mut K {
        &mut self.keyring
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn domains(&self) -> &TrustDomains {
        &self.domains
    }

    pub fn into_parts(self) -> (K, S) {
        (self.keyring, self.store)
    }

    /// Recipients that protect the secret at `path`.
    pub fn recipients_for(&self, path: &str) -> Result<Vec<Fingerprint>> {
        let path = path::secret(path)?;
        Ok(self.domains.recipients_for(&path).to_vec())
    }

    /// Reload trust domains from the committed tree.
    fn reload_domains(&mut self) -> Result<()> {
        self.domains = TrustDomains::load(&self.store)?;
        Ok(())
    }
}

/// Canonicalize a recipient list against the keyring.
///
/// Fingerprints are upper-cased and deduplicated in order. Every one must
/// name a usable key.
fn usable_recipients<K: Keyring + ?Sized>(
    keyring: &K,
    fingerprints: &[Fingerprint],
) -> Result<Vec<Fingerprint>> {
    let keys = keyring.list_keys()?;
    let mut out: Vec<Fingerprint> = Vec::with_capacity(fingerprints.len());
    for fingerprint in fingerprints {
        let fingerprint = fingerprint.trim().to_ascii_uppercase();
        if fingerprint.is_empty() || out.contains(&fingerprint) {
            continue;
        }
        match keys.iter().find(|k| k.fingerprint == fingerprint) {
            Some(key) if key.usable() => out.push(fingerprint),
            _ => return Err(KeyringError::UnknownRecipient(fingerprint).into()),
        }
    }
    if out.is_empty() {
        return Err(ValidationError::EmptyRecipients.into());
    }
    Ok(out)
}
