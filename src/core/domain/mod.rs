//! Domain types.

mod fields;
mod key;
mod record;
mod revision;

pub use fields::Fields;
pub use key::{fingerprint_of, key_id_of, PublicKeyRecord, X25519_BITS};
pub use record::SecretRecord;
pub use revision::Revision;
