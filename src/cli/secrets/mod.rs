//! Secret commands.
//!
//! `insert` and `edit` live in their own modules; the rest are thin enough
//! to sit here.

mod edit;
mod insert;
mod search;

use serde_json::json;

use crate::cli::output;
use crate::cli::session::Session;
use crate::core::path;
use crate::error::{Result, SecretError};

pub use edit::execute as edit;
pub use insert::execute as insert;
pub use search::execute as search;

/// Print a secret, one field, or both as JSON.
pub fn show(session: &Session, secret_path: &str, field: Option<&str>, json: bool) -> Result<()> {
    let store = session.open()?;
    let record = store.read(secret_path)?;

    if json {
        return output::json(&json!({
            "path": secret_path,
            "secret": record.secret(),
            "fields": record.fields(),
        }));
    }

    // Plain output for scripting - no decoration
    match field {
        Some(name) => {
            let value = record
                .fields()
                .get(name)
                .ok_or_else(|| SecretError::NotFound(format!("{}:{}", secret_path, name)))?;
            println!("{}", value);
        }
        None => println!("{}", record.secret()),
    }
    Ok(())
}

/// Move a secret.
pub fn mv(session: &Session, from: &str, to: &str) -> Result<()> {
    let mut store = session.open()?;
    store.rename(from, to)?;
    output::success(&format!("moved {} to {}", output::path(from), output::path(to)));
    Ok(())
}

/// Remove a secret.
pub fn rm(session: &Session, secret_path: &str) -> Result<()> {
    let mut store = session.open()?;
    store.delete(secret_path)?;
    output::success(&format!("removed {}", output::path(secret_path)));
    Ok(())
}

/// List secrets, optionally under one directory.
pub fn ls(session: &Session, dir: Option<&str>, json: bool) -> Result<()> {
    let store = session.open()?;
    let dir = path::dir(dir.unwrap_or(path::ROOT))?;
    let secrets: Vec<String> = store
        .list()?
        .into_iter()
        .filter(|p| path::is_within(p, &dir))
        .collect();

    if json {
        return output::json(&json!({
            "secrets": secrets,
            "count": secrets.len(),
        }));
    }
    if secrets.is_empty() {
        output::dimmed("no secrets");
        return Ok(());
    }
    for secret in &secrets {
        println!("{}", secret);
    }
    Ok(())
}
