//! Git-backed versioned store.
//!
//! Drives the `git` binary. Staged changes stay in memory; `apply` writes
//! them into the working tree, updates the index and commits. When any
//! step fails the work tree is reset to `HEAD` and files created by the
//! failed attempt are removed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::DateTime;
use tracing::{debug, info, warn};

use super::{Change, Staging, VersionedStore};
use crate::core::domain::Revision;
use crate::error::{Error, Result, StoreError};

/// Commit identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    /// The current OS user.
    pub fn current() -> Self {
        let name = whoami::username();
        let host = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
        Self {
            email: format!("{}@{}", name, host),
            name,
        }
    }
}

/// A git repository used as a versioned store.
#[derive(Debug)]
pub struct GitStore {
    root: PathBuf,
    git: PathBuf,
    author: Author,
    staging: Staging,
}

impl GitStore {
    /// Open an existing repository rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let git = which::which("git").map_err(|_| StoreError::GitNotFound)?;
        debug!(path = %root.display(), git = %git.display(), "opening git store");

        if !root.join(".git").exists() {
            return Err(StoreError::NotARepository(root.to_path_buf()).into());
        }

        Ok(Self {
            root: root.to_path_buf(),
            git,
            author: Author::current(),
            staging: Staging::default(),
        })
    }

    /// Create `root` if needed, run `git init` and open it.
    pub fn init(root: &Path) -> Result<Self> {
        let git = which::which("git").map_err(|_| StoreError::GitNotFound)?;
        fs::create_dir_all(root)?;
        if !root.join(".git").exists() {
            debug!(path = %root.display(), "initializing git repository");
            let output = Command::new(&git)
                .args(["init", "-q"])
                .current_dir(root)
                .output()?;
            if !output.status.success() {
                return Err(StoreError::Git {
                    command: "init".to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                }
                .into());
            }
        }
        Self::open(root)
    }

    /// Override the commit author.
    pub fn with_author(mut self, author: Author) -> Self {
        self.author = author;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.git);
        cmd.args(["-c", "commit.gpgsign=false", "--literal-pathspecs"])
            .args(args)
            .current_dir(&self.root)
            .env("GIT_AUTHOR_NAME", &self.author.name)
            .env("GIT_AUTHOR_EMAIL", &self.author.email)
            .env("GIT_COMMITTER_NAME", &self.author.name)
            .env("GIT_COMMITTER_EMAIL", &self.author.email);
        cmd
    }

    /// Run git and return its output regardless of exit status.
    fn run_raw(&self, args: &[&str]) -> Result<Output> {
        Ok(self.command(args).output()?)
    }

    /// Run git, failing on a non-zero exit.
    fn run(&self, args: &[&str]) -> Result<Output> {
        let output = self.run_raw(args)?;
        if !output.status.success() {
            return Err(StoreError::Git {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(output)
    }

    fn tracked(&self, path: &str) -> Result<bool> {
        let output = self.run(&["ls-files", "-z", "--", path])?;
        Ok(output
            .stdout
            .split(|&b| b == 0)
            .any(|p| p == path.as_bytes()))
    }

    fn has_head(&self) -> Result<bool> {
        Ok(self
            .run_raw(&["rev-parse", "--verify", "-q", "HEAD"])?
            .status
            .success())
    }

    fn write_file(&self, path: &str, contents: &[u8], mode: Option<u32>) -> Result<()> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, contents)?;

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full, fs::Permissions::from_mode(mode))?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(())
    }

    fn write_changes(&self, changes: &[Change], created: &mut Vec<String>) -> Result<()> {
        for change in changes {
            match change {
                Change::Create {
                    path,
                    contents,
                    mode,
                } => {
                    created.push(path.clone());
                    self.write_file(path, contents, Some(*mode))?;
                    self.run(&["add", "--", path.as_str()])?;
                }
                Change::Update { path, contents } => {
                    self.write_file(path, contents, None)?;
                    self.run(&["add", "--", path.as_str()])?;
                }
                Change::Rename { from, to } => {
                    if let Some(parent) = self.root.join(to).parent() {
                        fs::create_dir_all(parent)?;
                    }
                    created.push(to.clone());
                    self.run(&["mv", "--", from.as_str(), to.as_str()])?;
                }
                Change::Remove { path } => {
                    self.run(&["rm", "-q", "--", path.as_str()])?;
                }
            }
        }
        Ok(())
    }

    /// Restore the work tree and index to `HEAD`.
    fn rollback(&self, created: &[String]) -> Result<()> {
        if self.has_head()? {
            self.run(&["reset", "-q", "--hard", "HEAD"])?;
        } else {
            self.run(&["rm", "-r", "-q", "--cached", "--ignore-unmatch", "--", "."])?;
        }
        for path in created {
            let full = self.root.join(path);
            if full.exists() && !self.tracked(path)? {
                fs::remove_file(&full)?;
            }
        }
        Ok(())
    }
}

impl VersionedStore for GitStore {
    fn list_paths(&self) -> Result<Vec<String>> {
        let output = self.run(&["ls-files", "-z"])?;
        Ok(output
            .stdout
            .split(|&b| b == 0)
            .filter(|p| !p.is_empty())
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        if !self.tracked(path)? {
            return Err(StoreError::NotTracked(path.to_string()).into());
        }
        Ok(fs::read(self.root.join(path))?)
    }

    fn stage_create(&mut self, path: &str, contents: Vec<u8>, mode: u32) -> Result<()> {
        let committed = self.tracked(path)?;
        self.staging.create(path, contents, mode, committed)
    }

    fn stage_update(&mut self, path: &str, contents: Vec<u8>) -> Result<()> {
        let committed = self.tracked(path)?;
        self.staging.update(path, contents, committed)
    }

    fn stage_rename(&mut self, from: &str, to: &str) -> Result<()> {
        let (from_committed, to_committed) = (self.tracked(from)?, self.tracked(to)?);
        self.staging.rename(from, to, from_committed, to_committed)
    }

    fn stage_remove(&mut self, path: &str) -> Result<()> {
        let committed = self.tracked(path)?;
        self.staging.remove(path, committed)
    }

    fn apply(&mut self, message: &str) -> Result<()> {
        let changes = self.staging.take();
        if changes.is_empty() {
            debug!("nothing staged");
            return Ok(());
        }

        let mut created = Vec::new();
        let attempt = self.write_changes(&changes, &mut created).and_then(|_| {
            self.run(&["commit", "-q", "--allow-empty", "-m", message])
                .map(|_| ())
        });

        match attempt {
            Ok(()) => {
                info!(changes = changes.len(), "{}", message);
                Ok(())
            }
            Err(cause) => {
                warn!(error = %cause, "commit failed, rolling back");
                if let Err(e) = self.rollback(&created) {
                    return Err(StoreError::RollbackFailed {
                        reason: e.to_string(),
                        cause: cause.to_string(),
                    }
                    .into());
                }
                Err(StoreError::CommitFailed {
                    message: message.to_string(),
                    reason: cause.to_string(),
                }
                .into())
            }
        }
    }

    fn discard(&mut self) {
        self.staging.clear();
    }

    fn has_staged(&self) -> bool {
        !self.staging.is_empty()
    }

    fn revision_of(&self, reference: &str) -> Result<Revision> {
        let output = self
            .run(&["log", "-1", "--format=%H%x00%an%x00%at%x00%s", reference, "--"])
            .map_err(|_| StoreError::UnknownRevision(reference.to_string()))?;
        let text = String::from_utf8_lossy(&output.stdout);
        let mut parts = text.trim_end_matches('\n').splitn(4, '\0');
        let mut next = || parts.next().unwrap_or_default().to_string();
        let (id, author, seconds, summary) = (next(), next(), next(), next());

        let timestamp = seconds
            .parse::<i64>()
            .ok()
            .and_then(|s| DateTime::from_timestamp(s, 0))
            .ok_or_else(|| StoreError::UnknownRevision(reference.to_string()))?;

        Ok(Revision {
            id,
            author,
            timestamp,
            summary,
        })
    }

    fn is_ancestor(&self, a: &str, b: &str) -> Result<bool> {
        let output = self.run_raw(&["merge-base", "--is-ancestor", a, b])?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(Error::from(StoreError::Git {
                command: "merge-base".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })),
        }
    }
}
