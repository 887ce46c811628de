//! Edit command - change value, fields or location of a secret.

use tracing::info;

use super::insert::{read_secret, split_pair};
use crate::cli::output;
use crate::cli::session::Session;
use crate::core::domain::SecretRecord;
use crate::error::{Result, ValidationError};

/// Edit a secret in one commit.
pub fn execute(
    session: &Session,
    path: &str,
    new_secret: bool,
    set: &[String],
    unset: &[String],
    to: Option<&str>,
) -> Result<()> {
    if !new_secret && set.is_empty() && unset.is_empty() && to.is_none() {
        return Err(
            ValidationError::Invalid("nothing to change; see cellar edit --help".to_string())
                .into(),
        );
    }
    info!(path, "editing secret");
    let mut store = session.open()?;
    let current = store.read(path)?;

    let mut fields = current.fields().clone();
    for pair in set {
        let (key, value) = split_pair(pair)?;
        fields.set(key, value)?;
    }
    for key in unset {
        fields.remove(key.trim());
    }

    let record = if new_secret {
        let secret = read_secret(&format!("New secret for {}", output::path(path)))?;
        SecretRecord::new(secret.as_str(), fields)?
    } else {
        SecretRecord::new(current.secret(), fields)?
    };

    match to {
        Some(to) => {
            store.replace(path, to, &record)?;
            output::success(&format!("replaced {} with {}", output::path(path), output::path(to)));
        }
        None => {
            store.update(path, &record)?;
            output::success(&format!("updated {}", output::path(path)));
        }
    }
    Ok(())
}
