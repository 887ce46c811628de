//! Public key records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::types::Fingerprint;

/// Length of a fingerprint in bytes (40 hex digits).
const FINGERPRINT_BYTES: usize = 20;

/// Length of a key id in hex digits.
const KEY_ID_LEN: usize = 16;

/// Bit length reported for x25519 keys.
pub const X25519_BITS: u32 = 256;

/// Snapshot of one key known to a keyring.
///
/// Re-list after any keyring mutation; records are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    pub key_id: String,
    pub fingerprint: Fingerprint,
    pub name: String,
    pub email: String,
    pub recipient: String,
    pub subkey: bool,
    pub bits: u32,
    pub created: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub can_encrypt: bool,
    pub can_decrypt: bool,
    pub trusted: bool,
}

impl PublicKeyRecord {
    /// Whether the key has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the key has expired at `now`. Expiry is inclusive.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }

    /// Whether the key may be used as an encryption recipient.
    pub fn usable(&self) -> bool {
        self.can_encrypt && !self.is_expired()
    }

    /// Match by key id, fingerprint or email, ignoring case.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        !query.is_empty()
            && (self.key_id.eq_ignore_ascii_case(query)
                || self.fingerprint.eq_ignore_ascii_case(query)
                || self.email.eq_ignore_ascii_case(query))
    }

    /// `Name <email>` for display.
    pub fn user_id(&self) -> String {
        match (self.name.is_empty(), self.email.is_empty()) {
            (false, false) => format!("{} <{}>", self.name, self.email),
            (false, true) => self.name.clone(),
            (true, false) => format!("<{}>", self.email),
            (true, true) => String::new(),
        }
    }
}

/// Fingerprint of an age recipient string.
pub fn fingerprint_of(recipient: &str) -> Fingerprint {
    let digest = Sha256::digest(recipient.trim().as_bytes());
    digest[..FINGERPRINT_BYTES]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect()
}

/// Key id: the trailing 16 hex digits of a fingerprint.
pub fn key_id_of(fingerprint: &str) -> String {
    let start = fingerprint.len().saturating_sub(KEY_ID_LEN);
    fingerprint[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires: Option<DateTime<Utc>>) -> PublicKeyRecord {
        let recipient = "age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p";
        let fingerprint = fingerprint_of(recipient);
        PublicKeyRecord {
            key_id: key_id_of(&fingerprint),
            fingerprint,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            recipient: recipient.to_string(),
            subkey: false,
            bits: X25519_BITS,
            created: Utc::now(),
            expires,
            can_encrypt: true,
            can_decrypt: false,
            trusted: true,
        }
    }

    #[test]
    fn test_fingerprint_shape() {
        let fp = fingerprint_of("age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p");
        assert_eq!(fp.len(), 40);
        assert!(fp.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_eq!(key_id_of(&fp), fp[24..]);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint_of("age1abc");
        assert_eq!(a, fingerprint_of(" age1abc\n"));
        assert_ne!(a, fingerprint_of("age1abd"));
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let now = Utc::now();
        assert!(record(Some(now)).is_expired_at(now));
        assert!(!record(Some(now + Duration::hours(1))).is_expired_at(now));
        assert!(!record(None).is_expired_at(now));
    }

    #[test]
    fn test_usable_requires_unexpired() {
        assert!(record(None).usable());
        assert!(!record(Some(Utc::now() - Duration::days(1))).usable());
    }

    #[test]
    fn test_matches_id_fingerprint_or_email() {
        let r = record(None);
        assert!(r.matches(&r.key_id.to_lowercase()));
        assert!(r.matches(&r.fingerprint));
        assert!(r.matches("ALICE@example.com"));
        assert!(!r.matches("bob@example.com"));
        assert!(!r.matches(""));
    }

    #[test]
    fn test_user_id() {
        assert_eq!(record(None).user_id(), "Alice <alice@example.com>");
    }
}
