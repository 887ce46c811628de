//! Keys list command.

use crate::cli::output;
use crate::cli::session::Session;
use crate::core::domain::PublicKeyRecord;
use crate::core::keyring::Keyring;
use crate::error::Result;

/// List known keys, or only those with a secret half.
pub fn execute(session: &Session, secret: bool, json: bool) -> Result<()> {
    let keyring = session.keyring()?;
    let keys = if secret {
        keyring.list_secret_keys()?
    } else {
        keyring.list_keys()?
    };

    if json {
        return output::json(&keys);
    }
    if keys.is_empty() {
        output::dimmed("no keys");
        output::hint("run: cellar keys generate");
        return Ok(());
    }

    output::header(&format!("{} key(s)", keys.len()));
    output::rule();
    for key in &keys {
        print_key(key);
    }
    Ok(())
}

fn print_key(key: &PublicKeyRecord) {
    output::section(&output::key(&key.key_id));
    output::kv("fingerprint", &key.fingerprint);
    output::kv("user", key.user_id());
    output::kv("created", key.created.format("%Y-%m-%d"));
    if let Some(expires) = key.expires {
        output::kv("expires", expires.format("%Y-%m-%d"));
    }

    let mut flags = Vec::new();
    if key.can_decrypt {
        flags.push("secret");
    }
    if key.trusted {
        flags.push("trusted");
    }
    if key.is_expired() {
        flags.push("expired");
    }
    if !flags.is_empty() {
        output::kv("flags", flags.join(", "));
    }
}
