//! Import from other password managers' export files.
//!
//! Chrome's "Export passwords" CSV carries `name`, `url`, `username`,
//! `password` and sometimes `note` columns. Each row becomes the secret
//! `<name>/<username>` with the password as its primary line and the
//! remaining non-empty columns as fields. Rows are committed one at a time,
//! so an aborted import keeps the rows before the failure.

use std::io::Read;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{PasswordStore, Skipped};
use crate::core::constants::DEFAULT_MODE;
use crate::core::domain::{Fields, SecretRecord};
use crate::core::history::VersionedStore;
use crate::core::keyring::Keyring;
use crate::error::{ErrorKind, Result, ValidationError};

/// How to treat rows that collide or fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Update secrets that already exist instead of failing.
    pub overwrite: bool,
    /// Keep going after a failed row.
    pub ignore_failures: bool,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Secret paths written, in file order.
    pub imported: Vec<String>,
    /// Rows that could not be written.
    pub failed: Vec<Skipped>,
    /// 1-based lines whose column count did not match the header.
    pub malformed: Vec<u64>,
}

struct Columns {
    name: usize,
    username: usize,
    password: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
                .ok_or_else(|| {
                    ValidationError::Invalid(format!("password file has no {} column", wanted))
                })
        };
        Ok(Self {
            name: find("name")?,
            username: find("username")?,
            password: find("password")?,
        })
    }
}

impl<K: Keyring, S: VersionedStore> PasswordStore<K, S> {
    /// Import a Chrome password export.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` when the header lacks a required column or the
    ///   CSV cannot be parsed
    /// - the first row failure, unless `ignore_failures` is set
    pub fn import_chrome_csv<R: Read>(
        &mut self,
        input: R,
        options: ImportOptions,
    ) -> Result<ImportReport> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
        let headers = reader.headers()?.clone();
        let columns = Columns::locate(&headers)?;
        let mut report = ImportReport::default();

        for row in reader.records() {
            let row = row?;
            let line = row.position().map_or(0, |p| p.line());
            if row.len() != headers.len() {
                warn!(line, "row has {} columns, expected {}", row.len(), headers.len());
                report.malformed.push(line);
                continue;
            }

            let path = entry_path(&row[columns.name], &row[columns.username]);
            match self.import_row(&path, &headers, &row, &columns, options.overwrite) {
                Ok(()) => {
                    debug!(path = %path, "imported");
                    report.imported.push(path);
                }
                Err(e) if options.ignore_failures => {
                    warn!(line, path = %path, error = %e, "skipping row");
                    report.failed.push(Skipped {
                        path,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            imported = report.imported.len(),
            failed = report.failed.len(),
            malformed = report.malformed.len(),
            "import finished"
        );
        Ok(report)
    }

    fn import_row(
        &mut self,
        path: &str,
        headers: &csv::StringRecord,
        row: &csv::StringRecord,
        columns: &Columns,
        overwrite: bool,
    ) -> Result<()> {
        let password = &row[columns.password];
        if password.is_empty() {
            return Err(ValidationError::Invalid(format!("{}: empty password", path)).into());
        }

        let mut fields = Fields::new();
        for (i, (header, value)) in headers.iter().zip(row.iter()).enumerate() {
            if i == columns.name || i == columns.password || i == columns.username {
                continue;
            }
            if !value.trim().is_empty() {
                fields.set(header, value)?;
            }
        }
        let username = row[columns.username].trim();
        if !username.is_empty() {
            fields.set("username", username)?;
        }
        let record = SecretRecord::new(password, fields)?;

        match self.create(path, &record, DEFAULT_MODE) {
            Err(e) if overwrite && e.kind() == ErrorKind::AlreadyExists => {
                self.update(path, &record)
            }
            other => other,
        }
    }
}

/// `<name>/<username>`, or just `<name>` when the username is blank.
fn entry_path(name: &str, username: &str) -> String {
    let (name, username) = (name.trim(), username.trim());
    if username.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", name, username)
    }
}
