//! Core library components.
//!
//! Everything here is independent of the command line: the keyring and
//! versioned-store backends, the secret codec, trust domain resolution and
//! the [`store::PasswordStore`] that ties them together.

pub mod codec;
pub mod config;
pub mod constants;
pub mod domain;
pub mod history;
pub mod keyring;
pub mod path;
pub mod store;
pub mod trust;
pub mod types;
