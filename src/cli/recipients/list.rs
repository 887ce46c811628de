//! Recipients list command.

use serde_json::json;

use crate::cli::output;
use crate::cli::session::Session;
use crate::core::keyring::Keyring;
use crate::core::path;
use crate::error::Result;

/// List the recipients in effect for a directory.
pub fn execute(session: &Session, dir: &str, json: bool) -> Result<()> {
    let store = session.open()?;
    let dir = path::dir(dir)?;
    let domain = store.domains().domain_of_dir(&dir).to_string();
    let recipients = store.recipients_of_dir(&dir)?;
    let keys = store.keyring().list_keys()?;

    if json {
        let entries: Vec<_> = recipients
            .iter()
            .map(|fp| {
                let key = keys.iter().find(|k| k.fingerprint == *fp);
                json!({
                    "fingerprint": fp,
                    "user_id": key.map(|k| k.user_id()),
                    "known": key.is_some(),
                })
            })
            .collect();
        return output::json(&json!({
            "dir": dir,
            "domain": domain,
            "recipients": entries,
        }));
    }

    output::header(&format!("{} recipient(s) for {}", recipients.len(), output::path(&dir)));
    if domain != dir {
        output::dimmed(&format!("inherited from {}", domain));
    }
    output::rule();
    for fingerprint in &recipients {
        match keys.iter().find(|k| k.fingerprint == *fingerprint) {
            Some(key) => output::kv(&key.key_id, key.user_id()),
            None => output::kv(fingerprint, "(not in keyring)"),
        }
    }
    Ok(())
}
