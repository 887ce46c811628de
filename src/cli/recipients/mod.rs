//! Recipient commands.
//!
//! Adding or removing a recipient re-encrypts every secret the directory's
//! trust domain governs, in one commit.

mod add;
mod list;
mod rm;

use crate::cli::output;
use crate::core::store::ReinitReport;

pub use add::execute as add;
pub use list::execute as list;
pub use rm::execute as rm;

/// Summarize a rotation.
pub(crate) fn report(report: &ReinitReport) {
    output::kv("domain", &report.dir);
    output::kv("reencrypted", report.reencrypted.len());
    if !report.skipped.is_empty() {
        output::warn(&format!(
            "{} secret(s) could not be decrypted and keep their old recipients",
            report.skipped.len()
        ));
        for skipped in &report.skipped {
            output::list_item(&output::path(&skipped.path));
        }
    }
}
