//! Commit metadata reported by a versioned store.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One commit in a store's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    pub id: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
}

impl Revision {
    /// Abbreviated commit id.
    pub fn short_id(&self) -> &str {
        let end = self.id.len().min(8);
        &self.id[..end]
    }
}
