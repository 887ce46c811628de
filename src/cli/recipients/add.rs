//! Recipients add command.

use tracing::info;

use crate::cli::output;
use crate::cli::session::{resolve_key, Session};
use crate::error::Result;

/// Add a recipient to a directory's trust domain.
pub fn execute(session: &Session, dir: &str, key: &str, skip: Option<usize>) -> Result<()> {
    let mut store = session.open()?;
    let fingerprint = resolve_key(store.keyring(), key)?;
    info!(dir, fingerprint = %fingerprint, "adding recipient");

    let report = store.add_recipient(dir, &fingerprint, session.skip_budget(skip))?;
    output::success(&format!("added {}", output::key(&fingerprint)));
    super::report(&report);
    Ok(())
}
