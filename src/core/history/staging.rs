//! Staged changes shared by the store backends.
//!
//! Backends report whether a path is tracked in the last commit; the
//! overlay here folds in earlier staged changes so that a create after a
//! staged remove (or an update after a staged rename) behaves the way it
//! will once applied.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, StoreError};

/// One staged file mutation.
#[derive(Clone, PartialEq, Eq)]
pub enum Change {
    Create {
        path: String,
        contents: Vec<u8>,
        mode: u32,
    },
    Update {
        path: String,
        contents: Vec<u8>,
    },
    Rename {
        from: String,
        to: String,
    },
    Remove {
        path: String,
    },
}

impl fmt::Debug for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { path, contents, mode } => write!(
                f,
                "Create({}, {} bytes, {:o})",
                path,
                contents.len(),
                mode
            ),
            Self::Update { path, contents } => {
                write!(f, "Update({}, {} bytes)", path, contents.len())
            }
            Self::Rename { from, to } => write!(f, "Rename({} -> {})", from, to),
            Self::Remove { path } => write!(f, "Remove({})", path),
        }
    }
}

/// Ordered staged changes plus the tracked-set overlay they imply.
#[derive(Debug, Default)]
pub struct Staging {
    changes: Vec<Change>,
    added: BTreeSet<String>,
    removed: BTreeSet<String>,
}

impl Staging {
    /// Whether `path` will be tracked once the staged changes apply.
    pub fn tracked(&self, path: &str, committed: bool) -> bool {
        if self.added.contains(path) {
            true
        } else if self.removed.contains(path) {
            false
        } else {
            committed
        }
    }

    pub fn create(&mut self, path: &str, contents: Vec<u8>, mode: u32, committed: bool) -> Result<()> {
        if self.tracked(path, committed) {
            return Err(StoreError::AlreadyTracked(path.to_string()).into());
        }
        self.mark_added(path);
        self.changes.push(Change::Create {
            path: path.to_string(),
            contents,
            mode,
        });
        Ok(())
    }

    pub fn update(&mut self, path: &str, contents: Vec<u8>, committed: bool) -> Result<()> {
        if !self.tracked(path, committed) {
            return Err(StoreError::NotTracked(path.to_string()).into());
        }
        self.changes.push(Change::Update {
            path: path.to_string(),
            contents,
        });
        Ok(())
    }

    pub fn rename(
        &mut self,
        from: &str,
        to: &str,
        from_committed: bool,
        to_committed: bool,
    ) -> Result<()> {
        if !self.tracked(from, from_committed) {
            return Err(StoreError::NotTracked(from.to_string()).into());
        }
        if self.tracked(to, to_committed) {
            return Err(StoreError::AlreadyTracked(to.to_string()).into());
        }
        self.mark_removed(from);
        self.mark_added(to);
        self.changes.push(Change::Rename {
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }

    pub fn remove(&mut self, path: &str, committed: bool) -> Result<()> {
        if !self.tracked(path, committed) {
            return Err(StoreError::NotTracked(path.to_string()).into());
        }
        self.mark_removed(path);
        self.changes.push(Change::Remove {
            path: path.to_string(),
        });
        Ok(())
    }

    /// Take every staged change, leaving the overlay empty.
    pub fn take(&mut self) -> Vec<Change> {
        self.added.clear();
        self.removed.clear();
        std::mem::take(&mut self.changes)
    }

    pub fn clear(&mut self) {
        self.take();
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    fn mark_added(&mut self, path: &str) {
        self.removed.remove(path);
        self.added.insert(path.to_string());
    }

    fn mark_removed(&mut self, path: &str) {
        self.added.remove(path);
        self.removed.insert(path.to_string());
    }
}
