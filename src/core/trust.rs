//! Trust domain resolution.
//!
//! A directory declares its recipients with a `.age-id` marker holding
//! whitespace-separated fingerprints. A secret is governed by the marker in
//! its nearest enclosing directory; the root marker is the fallback and
//! must exist.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::history::VersionedStore;
use crate::core::path::{self, ROOT};
use crate::core::types::Fingerprint;
use crate::error::{Result, StoreError};

/// Declared recipient lists by directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustDomains {
    domains: BTreeMap<String, Vec<Fingerprint>>,
}

impl TrustDomains {
    /// Read every tracked marker from `store`.
    ///
    /// # Errors
    ///
    /// `MissingDefaultDomain` when the root has no marker.
    pub fn load<S: VersionedStore + ?Sized>(store: &S) -> Result<Self> {
        let mut domains = BTreeMap::new();
        for file in store.list_paths()? {
            if let Some(dir) = path::marker_dir(&file) {
                let fingerprints = parse_marker(&store.read(&file)?);
                domains.insert(dir.to_string(), fingerprints);
            }
        }
        if !domains.contains_key(ROOT) {
            return Err(StoreError::MissingDefaultDomain.into());
        }
        debug!(domains = domains.len(), "trust domains loaded");
        Ok(Self { domains })
    }

    /// Directory whose marker governs the secret at `path`.
    pub fn domain_of(&self, path: &str) -> &str {
        self.domain_of_dir(path::parent(path))
    }

    /// Nearest directory at or above `dir` with a marker.
    pub fn domain_of_dir(&self, dir: &str) -> &str {
        let mut current = dir;
        loop {
            if let Some((declared, _)) = self.domains.get_key_value(current) {
                return declared;
            }
            if current == ROOT {
                return ROOT;
            }
            current = path::parent(current);
        }
    }

    /// Recipients for the secret at `path`.
    pub fn recipients_for(&self, path: &str) -> &[Fingerprint] {
        self.declared(self.domain_of(path)).unwrap_or_default()
    }

    /// Recipients in effect for `dir`, declared there or inherited.
    pub fn recipients_for_dir(&self, dir: &str) -> &[Fingerprint] {
        self.declared(self.domain_of_dir(dir)).unwrap_or_default()
    }

    /// Recipients declared by a marker in exactly `dir`.
    pub fn declared(&self, dir: &str) -> Option<&[Fingerprint]> {
        self.domains.get(dir).map(Vec::as_slice)
    }

    /// Every declared domain, sorted by directory.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Fingerprint])> {
        self.domains
            .iter()
            .map(|(dir, fps)| (dir.as_str(), fps.as_slice()))
    }

    /// Copy with the domain at `dir` set to `fingerprints`.
    pub fn with_domain(&self, dir: &str, fingerprints: &[Fingerprint]) -> Self {
        let mut next = self.clone();
        next.domains.insert(dir.to_string(), fingerprints.to_vec());
        next
    }
}

/// Marker file and canonical marker bytes declaring `fingerprints` at `dir`.
///
/// Fingerprints are newline-joined in the given order with a trailing
/// newline.
pub fn declare_domain(dir: &str, fingerprints: &[Fingerprint]) -> (String, Vec<u8>) {
    let mut contents = fingerprints.join("\n");
    contents.push('\n');
    (path::marker_file(dir), contents.into_bytes())
}

/// Parse marker content: whitespace-separated fingerprints.
///
/// Fingerprints are upper-cased and duplicates dropped, first one wins.
pub fn parse_marker(bytes: &[u8]) -> Vec<Fingerprint> {
    let mut out: Vec<Fingerprint> = Vec::new();
    for fp in String::from_utf8_lossy(bytes).split_whitespace() {
        let fp = fp.to_ascii_uppercase();
        if !out.contains(&fp) {
            out.push(fp);
        }
    }
    out
}
