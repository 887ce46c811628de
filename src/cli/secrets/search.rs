//! Search command.

use crate::cli::output;
use crate::cli::session::Session;
use crate::error::Result;

/// Search paths and fields.
pub fn execute(session: &Session, needle: &str, skip: Option<usize>, json: bool) -> Result<()> {
    let store = session.open()?;
    let report = store.search(needle, session.skip_budget(skip))?;

    if json {
        return output::json(&report);
    }

    if report.matches.is_empty() {
        output::dimmed("no matches");
    }
    for m in &report.matches {
        match m.line {
            Some(_) => println!("{}: {}", output::path(&m.path), m.text),
            None => println!("{}", output::path(&m.path)),
        }
    }
    if !report.skipped.is_empty() {
        output::warn(&format!(
            "{} secret(s) could not be decrypted and were skipped",
            report.skipped.len()
        ));
    }
    Ok(())
}
