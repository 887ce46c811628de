//! Insert command.
//!
//! Add a secret with hidden input, or one line from a pipe.

use std::io::{self, IsTerminal};

use dialoguer::Password;
use tracing::info;
use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::session::Session;
use crate::core::constants::DEFAULT_MODE;
use crate::core::domain::{Fields, SecretRecord};
use crate::error::{Result, ValidationError};

/// Add a secret.
pub fn execute(session: &Session, path: &str, pairs: &[String], force: bool) -> Result<()> {
    info!(path, force, "inserting secret");
    let mut store = session.open()?;

    let mut fields = Fields::new();
    for pair in pairs {
        let (key, value) = split_pair(pair)?;
        fields.set(key, value)?;
    }

    let secret = read_secret(&format!("Secret for {}", output::path(path)))?;
    let record = SecretRecord::new(secret.as_str(), fields)?;

    if force {
        store.write(path, &record, DEFAULT_MODE)?;
    } else {
        store.create(path, &record, DEFAULT_MODE)?;
    }
    output::success(&format!("created {}", output::path(path)));
    Ok(())
}

/// Prompt with confirmation on a terminal; read one line otherwise.
pub(super) fn read_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let secret = if io::stdin().is_terminal() {
        Zeroizing::new(
            Password::new()
                .with_prompt(prompt)
                .with_confirmation("Retype", "values do not match")
                .interact()?,
        )
    } else {
        let mut line = Zeroizing::new(String::new());
        io::stdin().read_line(&mut line)?;
        Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_string())
    };

    if secret.is_empty() {
        return Err(ValidationError::Invalid("secret cannot be empty".to_string()).into());
    }
    Ok(secret)
}

/// Split `key=value`.
pub(super) fn split_pair(pair: &str) -> Result<(&str, &str)> {
    pair.split_once('=').ok_or_else(|| {
        ValidationError::Invalid(format!("expected KEY=VALUE, got '{}'", pair)).into()
    })
}
