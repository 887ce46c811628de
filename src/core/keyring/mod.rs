//! Asymmetric encryption keyrings.
//!
//! The [`Keyring`] trait is everything the password store needs from an
//! encryption backend. [`AgeKeyring`] implements it natively on top of the
//! `age` crate with x25519 keys.
//!
//! ## Contract
//!
//! - `encrypt` never produces output for a partial recipient set: one bad
//!   recipient fails the whole call.
//! - `decrypt` tries every held secret key.
//! - Mutations (`import`, `set_trust`, `delete`, ...) invalidate earlier
//!   `list_keys` snapshots.

mod age;
mod envelope;

pub use self::age::AgeKeyring;
pub use envelope::Envelope;

use zeroize::Zeroizing;

use crate::core::domain::PublicKeyRecord;
use crate::core::types::Fingerprint;
use crate::error::Result;

/// Keys added by an import.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Fingerprints of newly known public keys.
    pub public: Vec<Fingerprint>,
    /// Fingerprints of newly held secret keys.
    pub secret: Vec<Fingerprint>,
}

impl ImportOutcome {
    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.secret.is_empty()
    }
}

/// Encryption backend.
pub trait Keyring {
    /// Every known key.
    fn list_keys(&self) -> Result<Vec<PublicKeyRecord>>;

    /// Keys whose secret half is held locally.
    fn list_secret_keys(&self) -> Result<Vec<PublicKeyRecord>> {
        Ok(self
            .list_keys()?
            .into_iter()
            .filter(|k| k.can_decrypt)
            .collect())
    }

    /// Encrypt for every fingerprint in `recipients`.
    ///
    /// # Errors
    ///
    /// `EncryptionFailed` when the set is empty or any recipient is
    /// unknown, expired or not encryption-capable.
    fn encrypt(&self, plaintext: &[u8], recipients: &[Fingerprint]) -> Result<Vec<u8>>;

    /// Decrypt with any held secret key.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Import public and secret keys.
    fn import(&mut self, material: &[u8]) -> Result<ImportOutcome>;

    fn set_trust(&mut self, fingerprint: &str, trusted: bool) -> Result<()>;

    /// Forget a public key. Refused while its secret key is held.
    fn delete(&mut self, fingerprint: &str) -> Result<()>;

    /// Forget a secret key, keeping the public half.
    fn delete_secret(&mut self, fingerprint: &str) -> Result<()>;

    /// Armored public key block suitable for `import`.
    fn export(&self, fingerprint: &str) -> Result<String>;

    /// Recipient fingerprints embedded in a ciphertext, without decrypting.
    fn recipients_of(&self, ciphertext: &[u8]) -> Result<Vec<String>>;
}

/// Find a usable key by key id, fingerprint or email.
///
/// Expired and non-encrypting keys never match.
pub fn find_key<'a>(keys: &'a [PublicKeyRecord], query: &str) -> Option<&'a PublicKeyRecord> {
    keys.iter().find(|k| k.usable() && k.matches(query))
}
