//! Keys import command.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::session::Session;
use crate::core::keyring::Keyring;
use crate::error::{Error, KeyringError, Result};

/// Import key material from a file or stdin.
pub fn execute(session: &Session, file: Option<&Path>) -> Result<()> {
    let material = Zeroizing::new(match file {
        Some(path) => fs::read(path)
            .map_err(|e| Error::from(e).during("read", path.display().to_string()))?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    });

    let mut keyring = session.keyring()?;
    let outcome = keyring.import(&material)?;
    if outcome.is_empty() {
        return Err(KeyringError::ImportFailed("no new keys found".to_string()).into());
    }

    for fingerprint in &outcome.public {
        output::success(&format!("imported public key {}", output::key(fingerprint)));
    }
    for fingerprint in &outcome.secret {
        output::success(&format!("imported secret key {}", output::key(fingerprint)));
    }
    if !outcome.public.is_empty() {
        output::hint("imported public keys are untrusted: cellar keys trust <key>");
    }
    Ok(())
}
