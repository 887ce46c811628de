//! Import command - bring passwords over from a browser export.

use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::cli::output;
use crate::cli::session::Session;
use crate::core::store::ImportOptions;
use crate::error::{Error, Result};

/// Import a Chrome password CSV, one commit per row.
pub fn execute(
    session: &Session,
    chrome: &Path,
    overwrite: bool,
    ignore_failures: bool,
    json: bool,
) -> Result<()> {
    let mut store = session.open()?;
    let file = File::open(chrome)
        .map_err(|e| Error::from(e).during("read", chrome.display().to_string()))?;

    info!(file = %chrome.display(), overwrite, ignore_failures, "importing chrome passwords");
    let report = store.import_chrome_csv(
        file,
        ImportOptions {
            overwrite,
            ignore_failures,
        },
    )?;

    if json {
        return output::json(&report);
    }

    for path in &report.imported {
        output::list_item(&output::path(path));
    }
    output::success(&format!("imported {} secret(s)", report.imported.len()));

    if !report.failed.is_empty() {
        output::warn(&format!("{} row(s) failed", report.failed.len()));
        for failed in &report.failed {
            output::list_item(&format!("{}: {}", output::path(&failed.path), failed.reason));
        }
    }
    if !report.malformed.is_empty() {
        let lines: Vec<String> = report.malformed.iter().map(u64::to_string).collect();
        output::warn(&format!(
            "skipped line(s) {} with the wrong number of columns",
            lines.join(", ")
        ));
    }
    Ok(())
}
