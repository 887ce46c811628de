//! Plaintext layout of a secret file.
//!
//! The first line holds the primary secret, everything after the first
//! newline is the serialized field block.

/// Join a secret and its serialized fields.
pub fn format(secret: &str, fields: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(secret.len() + 1 + fields.len());
    out.extend_from_slice(secret.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(fields);
    out
}

/// Split plaintext at the first newline.
///
/// Without a newline the whole content is the secret and the field block
/// is empty.
pub fn parse(bytes: &[u8]) -> (&[u8], &[u8]) {
    match bytes.iter().position(|&b| b == b'\n') {
        Some(i) => (&bytes[..i], &bytes[i + 1..]),
        None => (bytes, b"".as_slice()),
    }
}
