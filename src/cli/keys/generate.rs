//! Keys generate command.

use chrono::{Duration, Utc};
use tracing::info;

use crate::cli::output;
use crate::cli::session::Session;
use crate::error::{Result, ValidationError};

/// Generate a new key pair.
pub fn execute(
    session: &Session,
    name: Option<String>,
    email: &str,
    expires_in: Option<i64>,
) -> Result<()> {
    let name = name.unwrap_or_else(whoami::username);
    let expires = match expires_in {
        Some(days) if days <= 0 => {
            return Err(ValidationError::Invalid(format!(
                "expiry must be a positive number of days, got {}",
                days
            ))
            .into());
        }
        Some(days) => Some(Utc::now() + Duration::days(days)),
        None => None,
    };

    info!(name = %name, "generating key");
    let mut keyring = session.keyring()?;
    let key = keyring.generate(&name, email, expires)?;

    output::success(&format!("generated {}", output::key(&key.key_id)));
    output::kv("fingerprint", &key.fingerprint);
    output::kv("recipient", &key.recipient);
    output::kv("user", key.user_id());
    Ok(())
}
