//! Recipient rotation.
//!
//! `reinit` re-encrypts every secret governed by one trust domain for a new
//! recipient set and rewrites the domain marker, all in a single commit.
//! Secrets that sit under a nested domain are not touched.
//!
//! Decrypt failures are tolerated up to `skip_budget`; one more aborts the
//! rotation and nothing staged so far is committed. A budget of 0 tolerates
//! none.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{usable_recipients, PasswordStore};
use crate::core::constants::DEFAULT_MODE;
use crate::core::history::{Transaction, VersionedStore};
use crate::core::keyring::Keyring;
use crate::core::path;
use crate::core::trust;
use crate::core::types::Fingerprint;
use crate::error::{Error, ErrorKind, KeyringError, Result, ValidationError};

/// A secret left under its old recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub path: String,
    pub reason: String,
}

/// Outcome of a successful rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReinitReport {
    pub dir: String,
    pub recipients: Vec<Fingerprint>,
    pub reencrypted: Vec<String>,
    pub skipped: Vec<Skipped>,
}

impl<K: Keyring, S: VersionedStore> PasswordStore<K, S> {
    /// Rotate the trust domain at `dir` to `fingerprints`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a bad directory or an empty set
    /// - `EncryptionFailed` for unknown or unusable recipients
    /// - `DecryptionFailed` once failures exceed `skip_budget`, or when no
    ///   governed secret could be decrypted
    /// - `CommitFailed` when the store cannot apply the rotation
    pub fn reinit(
        &mut self,
        dir: &str,
        fingerprints: &[Fingerprint],
        skip_budget: usize,
    ) -> Result<ReinitReport> {
        let dir = path::dir(dir)?;
        self.reinit_at(&dir, fingerprints, skip_budget)
            .map_err(|e| e.during("reinit", &dir))
    }

    fn reinit_at(
        &mut self,
        dir: &str,
        fingerprints: &[Fingerprint],
        skip_budget: usize,
    ) -> Result<ReinitReport> {
        let recipients = usable_recipients(&self.keyring, fingerprints)?;

        let next = self.domains.with_domain(dir, &recipients);
        let governed: Vec<String> = self
            .list()?
            .into_iter()
            .filter(|p| next.domain_of(p) == dir)
            .collect();
        debug!(dir, files = governed.len(), skip_budget, "rotating trust domain");

        let mut report = ReinitReport {
            dir: dir.to_string(),
            recipients: recipients.clone(),
            reencrypted: Vec::with_capacity(governed.len()),
            skipped: Vec::new(),
        };

        let mut tx = Transaction::begin(&mut self.store);
        for secret in &governed {
            let file = path::secret_file(secret);
            let ciphertext = tx.read(&file)?;
            let plaintext = match self.keyring.decrypt(&ciphertext) {
                Ok(plaintext) => plaintext,
                Err(e) if e.kind() == ErrorKind::DecryptionFailed => {
                    if report.skipped.len() >= skip_budget {
                        return Err(e.during("decrypt", secret.as_str()));
                    }
                    warn!(path = %secret, error = %e, "skipping undecryptable secret");
                    report.skipped.push(Skipped {
                        path: secret.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            let sealed = self.keyring.encrypt(&plaintext, &recipients)?;
            tx.stage_update(&file, sealed)?;
            report.reencrypted.push(secret.clone());
        }

        if !governed.is_empty() && report.reencrypted.is_empty() {
            return Err(KeyringError::DecryptionFailed(format!(
                "none of the {} secrets under {} could be decrypted",
                governed.len(),
                dir
            ))
            .into());
        }

        let (marker, contents) = trust::declare_domain(dir, &recipients);
        if self.domains.declared(dir).is_some() {
            tx.stage_update(&marker, contents)?;
        } else {
            tx.stage_create(&marker, contents, DEFAULT_MODE)?;
        }
        tx.commit(&format!(
            "reinitialized {} with new recipients [{}]",
            dir,
            recipients.join(", ")
        ))?;

        self.reload_domains()?;
        info!(
            dir,
            reencrypted = report.reencrypted.len(),
            skipped = report.skipped.len(),
            "trust domain rotated"
        );
        Ok(report)
    }

    /// Recipients in effect for `dir`, declared there or inherited.
    pub fn recipients_of_dir(&self, dir: &str) -> Result<Vec<Fingerprint>> {
        let dir = path::dir(dir)?;
        Ok(self.domains.recipients_for_dir(&dir).to_vec())
    }

    /// Rotate `dir` to its current recipients plus `fingerprint`.
    pub fn add_recipient(
        &mut self,
        dir: &str,
        fingerprint: &str,
        skip_budget: usize,
    ) -> Result<ReinitReport> {
        let mut recipients = self.recipients_of_dir(dir)?;
        let fingerprint = fingerprint.trim().to_ascii_uppercase();
        if recipients.contains(&fingerprint) {
            return Err(Error::from(KeyringError::AlreadyRecipient(fingerprint.clone()))
                .during("add recipient", fingerprint));
        }
        recipients.push(fingerprint);
        self.reinit(dir, &recipients, skip_budget)
    }

    /// Rotate `dir` to its current recipients minus `fingerprint`.
    ///
    /// # Errors
    ///
    /// `NotFound` when `fingerprint` is not a recipient, `InvalidArgument`
    /// when it is the last one.
    pub fn remove_recipient(
        &mut self,
        dir: &str,
        fingerprint: &str,
        skip_budget: usize,
    ) -> Result<ReinitReport> {
        let mut recipients = self.recipients_of_dir(dir)?;
        let fingerprint = fingerprint.trim().to_ascii_uppercase();
        if !recipients.contains(&fingerprint) {
            return Err(Error::from(KeyringError::NotRecipient(fingerprint.clone()))
                .during("remove recipient", fingerprint));
        }
        recipients.retain(|f| *f != fingerprint);
        if recipients.is_empty() {
            return Err(
                Error::from(ValidationError::EmptyRecipients).during("remove recipient", fingerprint)
            );
        }
        self.reinit(dir, &recipients, skip_budget)
    }
}
