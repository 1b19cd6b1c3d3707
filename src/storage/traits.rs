//! Visited store trait and error types
//!
//! This module defines the interface a visited-URL backend has to provide and
//! the errors it may report.

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record of absolute URLs that have been fetched
///
/// The Harvester asks [`VisitedStore::is_visited`] before a fetch (unless
/// revisits are allowed) and calls [`VisitedStore::mark_visited`] after the
/// HTTP round trip succeeded. The two calls are made separately, so an
/// implementation only has to make each call atomic on its own.
///
/// Implementations must be shareable across threads; a store is shared by a
/// Harvester and all of its forks.
pub trait VisitedStore: Send + Sync {
    /// Returns true if the URL has been visited
    fn is_visited(&self, url: &str) -> StoreResult<bool>;

    /// Marks the URL as visited (idempotent)
    fn mark_visited(&self, url: &str) -> StoreResult<()>;
}
