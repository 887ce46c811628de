//! Scan command - report which keys protect which secrets.
//!
//! Read-only. Nothing is decrypted; recipients come from each file's
//! envelope.

use crate::cli::output;
use crate::cli::session::Session;
use crate::core::keyring::Keyring;
use crate::error::Result;

/// Print the recipient report.
pub fn execute(session: &Session, json: bool) -> Result<()> {
    let store = session.open()?;
    let report = store.scan()?;

    if json {
        return output::json(&report);
    }

    let keys = store.keyring().list_keys()?;
    let label = |fp: &str| {
        keys.iter()
            .find(|k| k.fingerprint == fp)
            .map(|k| format!("{} {}", output::key(&k.key_id), k.user_id()))
            .unwrap_or_else(|| output::key(fp))
    };

    output::header(&format!("{} secret(s)", report.files));
    output::rule();

    if !report.per_key.is_empty() {
        output::section("known keys");
        for (fingerprint, count) in &report.per_key {
            output::kv(&label(fingerprint), count);
        }
    }
    if !report.unknown.is_empty() {
        output::section("keys not in keyring");
        for (fingerprint, count) in &report.unknown {
            output::kv(&output::key(fingerprint), count);
        }
    }
    if !report.unused.is_empty() {
        output::section("declared but unused");
        for fingerprint in &report.unused {
            output::list_item(&label(fingerprint));
        }
    }
    if !report.mismatched.is_empty() {
        output::section("recipients differ from domain");
        for m in &report.mismatched {
            output::list_item(&format!(
                "{} (domain {})",
                output::path(&m.path),
                output::path(&m.domain)
            ));
        }
        output::hint("run: cellar reinit <dir> <keys...>");
    }
    if !report.unreadable.is_empty() {
        output::section("unreadable envelopes");
        for path in &report.unreadable {
            output::list_item(&output::path(path));
        }
    }
    if report.is_clean() {
        output::success("every secret matches its domain");
    }
    Ok(())
}
