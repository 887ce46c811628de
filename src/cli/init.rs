//! Init command - create the store and declare root recipients.

use tracing::info;

use crate::cli::output;
use crate::cli::session::{resolve_key, Session};
use crate::error::Result;

/// Create the store repository and write the root marker.
pub fn execute(session: &Session, recipients: &[String]) -> Result<()> {
    let keyring = session.keyring()?;
    let fingerprints = recipients
        .iter()
        .map(|r| resolve_key(&keyring, r))
        .collect::<Result<Vec<_>>>()?;

    info!(store = %session.store_dir.display(), "initializing store");
    let store = session.init(&fingerprints)?;

    output::success(&format!(
        "initialized {}",
        output::path(&session.store_dir.display().to_string())
    ));
    for fingerprint in store.recipients_of_dir(".")? {
        output::list_item(&output::key(&fingerprint));
    }
    Ok(())
}
