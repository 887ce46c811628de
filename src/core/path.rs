//! Logical path handling.
//!
//! Secret paths are relative and `/`-separated. The root directory is
//! spelled `.`. On disk a secret lives at `<path>.age` and a trust domain
//! marker at `<dir>/.age-id`.

use crate::core::constants::{MARKER, RESERVED_COMPONENTS, SUFFIX};
use crate::error::{Result, ValidationError};

/// The root directory.
pub const ROOT: &str = ".";

fn invalid(path: &str, reason: &str) -> crate::error::Error {
    ValidationError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn check_components(original: &str, path: &str) -> Result<()> {
    if path.starts_with('/') {
        return Err(invalid(original, "must be relative"));
    }
    if path.contains('\\') || path.contains('\0') {
        return Err(invalid(original, "contains a forbidden character"));
    }
    for component in path.split('/') {
        match component {
            "" => return Err(invalid(original, "empty path component")),
            "." | ".." => return Err(invalid(original, "relative components are not allowed")),
            c if RESERVED_COMPONENTS.contains(&c) => {
                return Err(invalid(original, "reserved name"));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Validate a logical secret path.
pub fn secret(path: &str) -> Result<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(invalid(path, "path is empty"));
    }
    if trimmed.ends_with('/') {
        return Err(invalid(path, "names a directory"));
    }
    check_components(path, trimmed)?;
    Ok(trimmed.to_string())
}

/// Validate a directory path. Empty and `.` both name the root.
pub fn dir(path: &str) -> Result<String> {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed == ROOT {
        return Ok(ROOT.to_string());
    }
    check_components(path, trimmed)?;
    Ok(trimmed.to_string())
}

/// Parent directory of a path, `.` for top-level entries.
pub fn parent(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => ROOT,
    }
}

/// Whether `path` lies inside `dir`.
pub fn is_within(path: &str, dir: &str) -> bool {
    dir == ROOT
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// On-disk file holding the secret at `path`.
pub fn secret_file(path: &str) -> String {
    format!("{}{}", path, SUFFIX)
}

/// Logical secret path of a tracked file, if it is a secret file.
pub fn secret_of(file: &str) -> Option<&str> {
    let stem = file.strip_suffix(SUFFIX)?;
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }
    Some(stem)
}

/// On-disk marker file for the trust domain at `dir`.
pub fn marker_file(dir: &str) -> String {
    if dir == ROOT {
        MARKER.to_string()
    } else {
        format!("{}/{}", dir, MARKER)
    }
}

/// Directory declared by a tracked marker file, if `file` is one.
pub fn marker_dir(file: &str) -> Option<&str> {
    if file == MARKER {
        return Some(ROOT);
    }
    file.strip_suffix(MARKER)?.strip_suffix('/')
}
