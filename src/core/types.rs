//! Type aliases for domain concepts.

/// A key fingerprint: 40 uppercase hex digits.
///
/// Recipient lists, trust-domain markers and envelopes all name keys by
/// fingerprint.
pub type Fingerprint = String;

/// A logical secret path, relative and `/`-separated, without the suffix.
pub type SecretPath = String;

/// Raw ciphertext as stored in a secret file.
pub type Ciphertext = Vec<u8>;
