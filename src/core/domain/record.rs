//! A decrypted secret: the primary value plus optional fields.

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

use crate::core::codec;
use crate::core::domain::Fields;
use crate::error::{Result, SecretError, ValidationError};

/// Plaintext content of one secret file.
///
/// The primary value is wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretRecord {
    secret: String,
    fields: Fields,
}

impl SecretRecord {
    /// Build a record. The primary secret may not span lines.
    pub fn new(secret: impl Into<String>, fields: Fields) -> Result<Self> {
        let secret = secret.into();
        if secret.contains('\n') {
            return Err(ValidationError::MultilineSecret.into());
        }
        Ok(Self { secret, fields })
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Serialize to the plaintext layout.
    pub fn encode(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(codec::format(&self.secret, &self.fields.to_bytes()))
    }

    /// Parse decrypted plaintext.
    pub fn decode(plaintext: &[u8]) -> Result<Self> {
        let (secret, fields) = codec::parse(plaintext);
        let secret = std::str::from_utf8(secret)
            .map_err(|e| SecretError::Malformed(format!("secret is not UTF-8: {}", e)))?;
        let fields = std::str::from_utf8(fields)
            .map_err(|e| SecretError::Malformed(format!("fields are not UTF-8: {}", e)))?;
        Ok(Self {
            secret: secret.trim_end_matches('\r').to_string(),
            fields: Fields::parse(fields),
        })
    }
}

impl Drop for SecretRecord {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("secret", &"[redacted]")
            .field("fields", &self.fields.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(secret: &str, pairs: &[(&str, &str)]) -> SecretRecord {
        let mut fields = Fields::new();
        for (k, v) in pairs {
            fields.set(k, v).unwrap();
        }
        SecretRecord::new(secret, fields).unwrap()
    }

    #[test]
    fn test_encode_layout() {
        let r = record("p@ss", &[("user", "alice")]);
        assert_eq!(r.encode().as_slice(), b"p@ss\nuser: alice\n");
    }

    #[test]
    fn test_decode_restores_record() {
        let r = record("p@ss", &[("user", "alice"), ("url", "https://site.com")]);
        let decoded = SecretRecord::decode(&r.encode()).unwrap();
        assert_eq!(decoded, r);
    }

    #[test]
    fn test_decode_bare_secret() {
        let r = SecretRecord::decode(b"hunter2").unwrap();
        assert_eq!(r.secret(), "hunter2");
        assert!(r.fields().is_empty());
    }

    #[test]
    fn test_rejects_multiline_secret() {
        assert!(SecretRecord::new("a\nb", Fields::new()).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let r = record("hunter2", &[]);
        assert!(!format!("{:?}", r).contains("hunter2"));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(SecretRecord::decode(&[0xff, 0xfe, b'\n']).is_err());
    }
}
