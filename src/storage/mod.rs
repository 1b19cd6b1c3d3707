//! Visited-URL storage
//!
//! The Harvester records every URL that completed an HTTP round trip in a
//! [`VisitedStore`]. Two backends ship with the crate:
//! - [`InMemoryStore`]: the default, lives as long as the Harvester
//! - [`SqliteStore`]: persistent, survives process restarts

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{StoreError, StoreResult, VisitedStore};

use std::path::Path;
use std::sync::Arc;

/// Opens a SQLite store ready to hand to
/// [`HarvesterBuilder::store`](crate::crawler::HarvesterBuilder::store)
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_sqlite_store(path: &Path) -> StoreResult<Arc<dyn VisitedStore>> {
    Ok(Arc::new(SqliteStore::new(path)?))
}
