//! Recipients rm command.

use tracing::info;

use crate::cli::output;
use crate::cli::session::{resolve_key, Session};
use crate::error::Result;

/// Remove a recipient from a directory's trust domain.
pub fn execute(session: &Session, dir: &str, key: &str, skip: Option<usize>) -> Result<()> {
    let mut store = session.open()?;
    let fingerprint = resolve_key(store.keyring(), key)?;
    info!(dir, fingerprint = %fingerprint, "removing recipient");

    let report = store.remove_recipient(dir, &fingerprint, session.skip_budget(skip))?;
    output::success(&format!("removed {}", output::key(&fingerprint)));
    super::report(&report);
    Ok(())
}
