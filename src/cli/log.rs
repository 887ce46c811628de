//! Log command - recent store history.

use crate::cli::output;
use crate::cli::session::Session;
use crate::core::history::VersionedStore;
use crate::error::{ErrorKind, Result};

/// Print up to `count` commits, newest first.
pub fn execute(session: &Session, count: usize) -> Result<()> {
    let store = session.open()?;
    let history = store.store();

    for back in 0..count {
        let revision = match history.revision_of(&format!("HEAD~{}", back)) {
            Ok(revision) => revision,
            // ran past the first commit
            Err(e) if e.kind() == ErrorKind::NotFound => break,
            Err(e) => return Err(e),
        };
        println!(
            "{} {} {} {}",
            output::key(revision.short_id()),
            revision.timestamp.format("%Y-%m-%d %H:%M"),
            revision.author,
            revision.summary
        );
    }
    Ok(())
}
