//! Serve command - speak the framed JSON protocol on stdio.

use std::io;

use tracing::info;

use crate::cli::session::Session;
use crate::error::Result;
use crate::protocol;

/// Serve requests from stdin until it closes.
pub fn execute(session: &Session) -> Result<()> {
    let mut store = session.open()?;
    let stdin = io::stdin();
    let stdout = io::stdout();

    let served = protocol::serve(&mut store, &mut stdin.lock(), &mut stdout.lock())?;
    info!(requests = served, "client disconnected");
    Ok(())
}
