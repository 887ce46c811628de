//! Versioned file stores.
//!
//! A [`VersionedStore`] tracks a tree of files and applies staged changes
//! as one commit. Staged changes live in memory until [`apply`] runs, so
//! nothing staged is ever visible through `read` or `list_paths`. If
//! `apply` fails the store is returned to its pre-`apply` content.
//!
//! [`apply`]: VersionedStore::apply

mod git;
mod memory;
mod staging;

pub use git::{Author, GitStore};
pub use memory::MemoryStore;
pub use staging::{Change, Staging};

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::core::domain::Revision;
use crate::error::Result;

/// File store with transactional commits and linear history queries.
pub trait VersionedStore {
    /// Every tracked path.
    fn list_paths(&self) -> Result<Vec<String>>;

    /// Committed content of a tracked path.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Stage a new file. Fails when `path` is tracked or staged.
    fn stage_create(&mut self, path: &str, contents: Vec<u8>, mode: u32) -> Result<()>;

    /// Stage new content for a tracked file.
    fn stage_update(&mut self, path: &str, contents: Vec<u8>) -> Result<()>;

    /// Stage a move of a tracked file to an untracked path.
    fn stage_rename(&mut self, from: &str, to: &str) -> Result<()>;

    /// Stage removal of a tracked file.
    fn stage_remove(&mut self, path: &str) -> Result<()>;

    /// Commit every staged change as one unit.
    ///
    /// The staged set is consumed whether or not the commit succeeds. An
    /// empty staged set commits nothing.
    ///
    /// # Errors
    ///
    /// `CommitFailed` after the store has been restored to its previous
    /// content.
    fn apply(&mut self, message: &str) -> Result<()>;

    /// Drop every staged change.
    fn discard(&mut self);

    fn has_staged(&self) -> bool;

    /// Metadata for a revision reference such as `HEAD` or `HEAD~2`.
    fn revision_of(&self, reference: &str) -> Result<Revision>;

    /// Whether revision `a` is an ancestor of (or equal to) `b`.
    fn is_ancestor(&self, a: &str, b: &str) -> Result<bool>;
}

/// Guard over one unit of staged work.
///
/// Dropping the guard without [`commit`](Transaction::commit) discards
/// everything staged through it.
pub struct Transaction<'a, S: VersionedStore + ?Sized> {
    store: &'a mut S,
    done: bool,
}

impl<'a, S: VersionedStore + ?Sized> Transaction<'a, S> {
    /// Start a transaction, dropping anything left staged earlier.
    pub fn begin(store: &'a mut S) -> Self {
        if store.has_staged() {
            debug!("discarding stale staged changes");
            store.discard();
        }
        Self { store, done: false }
    }

    /// Apply the staged changes with `message`.
    pub fn commit(mut self, message: &str) -> Result<()> {
        self.done = true;
        self.store.apply(message)
    }
}

impl<S: VersionedStore + ?Sized> Deref for Transaction<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.store
    }
}

impl<S: VersionedStore + ?Sized> DerefMut for Transaction<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.store
    }
}

impl<S: VersionedStore + ?Sized> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if !self.done && self.store.has_staged() {
            debug!("transaction dropped, discarding staged changes");
            self.store.discard();
        }
    }
}
