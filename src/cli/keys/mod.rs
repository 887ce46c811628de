//! Key management commands.

mod generate;
mod import;
mod list;

use std::io::{self, IsTerminal};

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::session::{lookup_key, Session};
use crate::core::keyring::Keyring;
use crate::error::Result;

pub use generate::execute as generate;
pub use import::execute as import;
pub use list::execute as list;

/// Print a public key in importable form.
pub fn export(session: &Session, query: &str) -> Result<()> {
    let keyring = session.keyring()?;
    let key = lookup_key(&keyring, query)?;
    print!("{}", keyring.export(&key.fingerprint)?);
    Ok(())
}

/// Mark a key trusted or untrusted.
pub fn trust(session: &Session, query: &str, trusted: bool) -> Result<()> {
    let mut keyring = session.keyring()?;
    let key = lookup_key(&keyring, query)?;
    keyring.set_trust(&key.fingerprint, trusted)?;

    let verb = if trusted { "trusted" } else { "untrusted" };
    output::success(&format!("{} {}", verb, output::key(&key.key_id)));
    Ok(())
}

/// Delete a public key, or only its secret half with `secret`.
pub fn delete(session: &Session, query: &str, secret: bool) -> Result<()> {
    let mut keyring = session.keyring()?;
    let key = lookup_key(&keyring, query)?;

    if secret && io::stdin().is_terminal() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete the secret key for {}? Secrets encrypted only to it become unreadable",
                key.user_id()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            output::dimmed("aborted");
            return Ok(());
        }
    }

    if secret {
        keyring.delete_secret(&key.fingerprint)?;
        output::success(&format!("deleted secret key {}", output::key(&key.key_id)));
    } else {
        keyring.delete(&key.fingerprint)?;
        output::success(&format!("deleted {}", output::key(&key.key_id)));
    }
    Ok(())
}
