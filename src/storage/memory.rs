//! In-memory visited store, the Harvester default

use crate::storage::traits::{StoreResult, VisitedStore};
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Visited set held in process memory behind a reader/writer lock
#[derive(Debug, Default)]
pub struct InMemoryStore {
    visited: RwLock<HashSet<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct URLs recorded
    pub fn len(&self) -> usize {
        self.visited
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VisitedStore for InMemoryStore {
    fn is_visited(&self, url: &str) -> StoreResult<bool> {
        let visited = self.visited.read().unwrap_or_else(PoisonError::into_inner);
        Ok(visited.contains(url))
    }

    fn mark_visited(&self, url: &str) -> StoreResult<()> {
        let mut visited = self.visited.write().unwrap_or_else(PoisonError::into_inner);
        visited.insert(url.to_string());
        Ok(())
    }
}
