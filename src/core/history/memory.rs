//! In-memory versioned store.
//!
//! Used as a test double and for failure injection: [`fail_next_apply`]
//! makes the next non-empty commit fail after its changes were staged.
//!
//! [`fail_next_apply`]: MemoryStore::fail_next_apply

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{Change, Staging, VersionedStore};
use crate::core::domain::Revision;
use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
struct File {
    contents: Vec<u8>,
    mode: u32,
}

#[derive(Debug, Clone)]
struct Commit {
    id: String,
    author: String,
    timestamp: DateTime<Utc>,
    summary: String,
}

/// Linear history of file trees kept in memory.
#[derive(Debug)]
pub struct MemoryStore {
    files: BTreeMap<String, File>,
    history: Vec<Commit>,
    staging: Staging,
    fail_next: Option<String>,
    author: String,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            history: Vec::new(),
            staging: Staging::default(),
            fail_next: None,
            author: "cellar".to_string(),
        }
    }

    /// Name recorded as the author of later commits.
    pub fn with_author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    /// Make the next non-empty `apply` fail with `reason`.
    pub fn fail_next_apply(&mut self, reason: &str) {
        self.fail_next = Some(reason.to_string());
    }

    /// Mode a tracked file was committed with.
    pub fn mode_of(&self, path: &str) -> Option<u32> {
        self.files.get(path).map(|f| f.mode)
    }

    /// Number of commits.
    pub fn commit_count(&self) -> usize {
        self.history.len()
    }

    fn tracked(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn replay(files: &mut BTreeMap<String, File>, changes: Vec<Change>) -> Result<()> {
        for change in changes {
            match change {
                Change::Create {
                    path,
                    contents,
                    mode,
                } => {
                    if files.contains_key(&path) {
                        return Err(StoreError::AlreadyTracked(path).into());
                    }
                    files.insert(path, File { contents, mode });
                }
                Change::Update { path, contents } => match files.get_mut(&path) {
                    Some(file) => file.contents = contents,
                    None => return Err(StoreError::NotTracked(path).into()),
                },
                Change::Rename { from, to } => {
                    let file = files
                        .remove(&from)
                        .ok_or_else(|| StoreError::NotTracked(from.clone()))?;
                    files.insert(to, file);
                }
                Change::Remove { path } => {
                    files
                        .remove(&path)
                        .ok_or_else(|| StoreError::NotTracked(path.clone()))?;
                }
            }
        }
        Ok(())
    }

    fn next_id(&self, summary: &str, timestamp: DateTime<Utc>) -> String {
        let mut hasher = Sha256::new();
        if let Some(parent) = self.history.last() {
            hasher.update(parent.id.as_bytes());
        }
        hasher.update(summary.as_bytes());
        hasher.update(timestamp.to_rfc3339().as_bytes());
        hasher.update(self.history.len().to_le_bytes());
        hasher.finalize()[..20]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    fn resolve(&self, reference: &str) -> Result<usize> {
        let unknown = || StoreError::UnknownRevision(reference.to_string());
        let head = self.history.len().checked_sub(1).ok_or_else(unknown)?;

        let back = match reference {
            "HEAD" | "@" => Some(0),
            "HEAD^" => Some(1),
            r => r
                .strip_prefix("HEAD~")
                .map(|n| n.parse::<usize>().map_err(|_| unknown()))
                .transpose()?,
        };
        if let Some(back) = back {
            return head.checked_sub(back).ok_or_else(|| unknown().into());
        }

        if reference.len() < 4 {
            return Err(unknown().into());
        }
        let mut matches = self
            .history
            .iter()
            .enumerate()
            .filter(|(_, c)| c.id.starts_with(reference));
        match (matches.next(), matches.next()) {
            (Some((i, _)), None) => Ok(i),
            _ => Err(unknown().into()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionedStore for MemoryStore {
    fn list_paths(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .map(|f| f.contents.clone())
            .ok_or_else(|| StoreError::NotTracked(path.to_string()).into())
    }

    fn stage_create(&mut self, path: &str, contents: Vec<u8>, mode: u32) -> Result<()> {
        let committed = self.tracked(path);
        self.staging.create(path, contents, mode, committed)
    }

    fn stage_update(&mut self, path: &str, contents: Vec<u8>) -> Result<()> {
        let committed = self.tracked(path);
        self.staging.update(path, contents, committed)
    }

    fn stage_rename(&mut self, from: &str, to: &str) -> Result<()> {
        let (from_committed, to_committed) = (self.tracked(from), self.tracked(to));
        self.staging.rename(from, to, from_committed, to_committed)
    }

    fn stage_remove(&mut self, path: &str) -> Result<()> {
        let committed = self.tracked(path);
        self.staging.remove(path, committed)
    }

    fn apply(&mut self, message: &str) -> Result<()> {
        let changes = self.staging.take();
        if changes.is_empty() {
            debug!("nothing staged");
            return Ok(());
        }

        if let Some(reason) = self.fail_next.take() {
            debug!(changes = changes.len(), "injected commit failure");
            return Err(StoreError::CommitFailed {
                message: message.to_string(),
                reason,
            }
            .into());
        }

        let count = changes.len();
        let mut next = self.files.clone();
        Self::replay(&mut next, changes).map_err(|e| StoreError::CommitFailed {
            message: message.to_string(),
            reason: e.to_string(),
        })?;

        let timestamp = Utc::now();
        let id = self.next_id(message, timestamp);
        self.files = next;
        self.history.push(Commit {
            id: id.clone(),
            author: self.author.clone(),
            timestamp,
            summary: message.lines().next().unwrap_or_default().to_string(),
        });

        info!(commit = %&id[..8], changes = count, "{}", message);
        Ok(())
    }

    fn discard(&mut self) {
        self.staging.clear();
    }

    fn has_staged(&self) -> bool {
        !self.staging.is_empty()
    }

    fn revision_of(&self, reference: &str) -> Result<Revision> {
        let commit = &self.history[self.resolve(reference)?];
        Ok(Revision {
            id: commit.id.clone(),
            author: commit.author.clone(),
            timestamp: commit.timestamp,
            summary: commit.summary.clone(),
        })
    }

    fn is_ancestor(&self, a: &str, b: &str) -> Result<bool> {
        Ok(self.resolve(a)? <= self.resolve(b)?)
    }
}
