//! Test support utilities for cellar integration tests.
//!
//! [`Test`] drives the binary against isolated directories; the
//! [`fixtures`] module builds in-process stores for library tests.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with an isolated home directory.
///
/// The store and keyring live under `home`; child processes get them
/// through environment variables so tests can run in parallel.
pub struct Test {
    /// Working directory for child processes
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
}

impl Test {
    /// Create an empty environment: no keys, no store.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        Self { dir, home }
    }

    pub fn store_dir(&self) -> PathBuf {
        self.home.path().join("store")
    }

    pub fn keyring_dir(&self) -> PathBuf {
        self.home.path().join("keyring")
    }

    /// Create an environment with one key and a store encrypted to it.
    pub fn init(email: &str) -> Self {
        let t = Self::new();
        assert_success(&t.generate("tester", email));
        assert_success(&t.init_cmd(&[email]));
        t
    }

    /// Create an initialized environment holding `secrets`.
    pub fn with_secrets(email: &str, secrets: &[(&str, &str)]) -> Self {
        let t = Self::init(email);
        for (path, value) in secrets {
            let output = t.insert(path, value);
            assert!(
                output.status.success(),
                "Failed to insert {}: {}",
                path,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        t
    }
}
