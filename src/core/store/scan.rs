//! Audit scan and plaintext search.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::{PasswordStore, Skipped};
use crate::core::domain::SecretRecord;
use crate::core::history::VersionedStore;
use crate::core::keyring::Keyring;
use crate::core::path;
use crate::core::types::Fingerprint;
use crate::error::{ErrorKind, Result};

/// A secret whose embedded recipients differ from its domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub path: String,
    pub domain: String,
    pub expected: Vec<Fingerprint>,
    pub actual: Vec<String>,
}

/// Recipient usage across the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Secrets examined.
    pub files: usize,
    /// Secrets per known key.
    pub per_key: BTreeMap<Fingerprint, usize>,
    /// Secrets per recipient id the keyring does not know.
    pub unknown: BTreeMap<String, usize>,
    /// Known keys no secret is encrypted for.
    pub unused: Vec<Fingerprint>,
    pub mismatched: Vec<Mismatch>,
    /// Secrets whose envelope could not be read.
    pub unreadable: Vec<String>,
}

impl ScanReport {
    /// Nothing unknown, mismatched or unreadable.
    pub fn is_clean(&self) -> bool {
        self.unknown.is_empty() && self.mismatched.is_empty() && self.unreadable.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub path: String,
    /// 1-based line within the decrypted fields; `None` for a path match.
    pub line: Option<usize>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub matches: Vec<SearchMatch>,
    pub skipped: Vec<Skipped>,
}

impl<K: Keyring, S: VersionedStore> PasswordStore<K, S> {
    /// Compare the recipients embedded in every secret with the keyring
    /// and the trust domains. Nothing is decrypted.
    pub fn scan(&self) -> Result<ScanReport> {
        let keys = self.keyring.list_keys()?;
        let mut report = ScanReport::default();

        for secret in self.list()? {
            report.files += 1;
            let ciphertext = self.store.read(&path::secret_file(&secret))?;
            let embedded = match self.keyring.recipients_of(&ciphertext) {
                Ok(embedded) if !embedded.is_empty() => embedded,
                Ok(_) => {
                    report.unreadable.push(secret);
                    continue;
                }
                Err(e) => {
                    debug!(path = %secret, error = %e, "unreadable envelope");
                    report.unreadable.push(secret);
                    continue;
                }
            };

            for id in &embedded {
                if keys.iter().any(|k| k.fingerprint == *id) {
                    *report.per_key.entry(id.clone()).or_default() += 1;
                } else {
                    *report.unknown.entry(id.clone()).or_default() += 1;
                }
            }

            let domain = self.domains.domain_of(&secret);
            let mut expected = self.domains.recipients_for(&secret).to_vec();
            let mut actual = embedded;
            expected.sort();
            actual.sort();
            if expected != actual {
                report.mismatched.push(Mismatch {
                    domain: domain.to_string(),
                    path: secret,
                    expected,
                    actual,
                });
            }
        }

        report.unused = keys
            .into_iter()
            .map(|k| k.fingerprint)
            .filter(|f| !report.per_key.contains_key(f))
            .collect();

        debug!(
            files = report.files,
            unknown = report.unknown.len(),
            mismatched = report.mismatched.len(),
            "scan complete"
        );
        Ok(report)
    }

    /// Find secrets whose path or field lines contain `needle`
    /// (case-insensitive). The primary secret line is never matched.
    ///
    /// # Errors
    ///
    /// `DecryptionFailed` once more than `skip_budget` secrets fail to
    /// decrypt.
    pub fn search(&self, needle: &str, skip_budget: usize) -> Result<SearchReport> {
        let needle = needle.to_lowercase();
        let mut report = SearchReport::default();

        for secret in self.list()? {
            if secret.to_lowercase().contains(&needle) {
                report.matches.push(SearchMatch {
                    path: secret.clone(),
                    line: None,
                    text: secret.clone(),
                });
            }

            let record = match self.read(&secret) {
                Ok(record) => record,
                Err(e) if e.kind() == ErrorKind::DecryptionFailed => {
                    if report.skipped.len() >= skip_budget {
                        return Err(e);
                    }
                    warn!(path = %secret, error = %e, "skipping undecryptable secret");
                    report.skipped.push(Skipped {
                        path: secret,
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            report.matches.extend(matching_lines(&secret, &record, &needle));
        }

        debug!(
            matches = report.matches.len(),
            skipped = report.skipped.len(),
            "search complete"
        );
        Ok(report)
    }
}

fn matching_lines(secret: &str, record: &SecretRecord, needle: &str) -> Vec<SearchMatch> {
    record
        .fields()
        .to_string()
        .lines()
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(needle))
        .map(|(i, line)| SearchMatch {
            path: secret.to_string(),
            line: Some(i + 1),
            text: line.to_string(),
        })
        .collect()
}
