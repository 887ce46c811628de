//! Ciphertext envelope.
//!
//! Wraps armored age ciphertext together with the fingerprints it was
//! encrypted for, so audits can read the recipient list without a secret
//! key.

use serde::{Deserialize, Serialize};

use crate::core::types::Fingerprint;
use crate::error::{KeyringError, Result};

const ENVELOPE_V1: &str = "cellar-envelope-v1";

/// Marker line that starts ASCII-armored age ciphertext.
pub const ARMOR_BEGIN: &str = "-----BEGIN AGE ENCRYPTED FILE-----";

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    version: String,
    /// Fingerprints the payload was encrypted for.
    pub recipients: Vec<Fingerprint>,
    /// Armored age ciphertext.
    pub age: String,
}

impl Envelope {
    pub fn new(recipients: Vec<Fingerprint>, age: String) -> Self {
        Self {
            version: ENVELOPE_V1.to_string(),
            recipients,
            age,
        }
    }

    /// Serialize the envelope to JSON bytes.
    pub fn seal(&self) -> Result<Vec<u8>> {
        let mut out = serde_json::to_vec(self).map_err(|e| {
            KeyringError::EncryptionFailed(format!("failed to serialize envelope: {}", e))
        })?;
        out.push(b'\n');
        Ok(out)
    }

    /// Try to parse ciphertext as an envelope.
    ///
    /// Returns `None` for anything else, including raw armored age.
    pub fn parse(ciphertext: &[u8]) -> Option<Self> {
        let envelope: Self = serde_json::from_slice(ciphertext).ok()?;
        (envelope.version == ENVELOPE_V1).then_some(envelope)
    }

    /// Whether the bytes look like raw armored age.
    pub fn is_raw_age(ciphertext: &[u8]) -> bool {
        std::str::from_utf8(ciphertext).is_ok_and(|s| s.trim_start().starts_with(ARMOR_BEGIN))
    }
}
