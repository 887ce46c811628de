//! Reinit command - replace a directory's recipients.

use tracing::info;

use crate::cli::output;
use crate::cli::recipients;
use crate::cli::session::{resolve_key, Session};
use crate::error::Result;

/// Rotate a trust domain to a new recipient set.
pub fn execute(session: &Session, dir: &str, keys: &[String], skip: Option<usize>) -> Result<()> {
    let mut store = session.open()?;
    let fingerprints = keys
        .iter()
        .map(|k| resolve_key(store.keyring(), k))
        .collect::<Result<Vec<_>>>()?;
    info!(dir, recipients = fingerprints.len(), "reinitializing");

    let report = store.reinit(dir, &fingerprints, session.skip_budget(skip))?;
    output::success(&format!(
        "reinitialized {} for {} recipient(s)",
        output::path(&report.dir),
        report.recipients.len()
    ));
    recipients::report(&report);
    Ok(())
}
