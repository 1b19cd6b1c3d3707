//! SQLite visited store
//!
//! This module provides a persistent implementation of the VisitedStore trait,
//! so a traversal can pick up where a previous process left off.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StoreResult, VisitedStore};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// SQLite-backed visited store
///
/// The connection is guarded by a mutex; each trait call is a single
/// statement, so each is atomic on its own.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates a store backed by an in-memory database
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of distinct URLs recorded
    pub fn count(&self) -> StoreResult<u64> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM visited_urls", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// How many successful round trips have been recorded for a URL
    pub fn visit_count(&self, url: &str) -> StoreResult<u64> {
        let count: Option<i64> = self
            .conn()
            .query_row(
                "SELECT visit_count FROM visited_urls WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0).max(0) as u64)
    }

    /// When the URL was first recorded, if ever
    pub fn first_visited_at(&self, url: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT first_visited_at FROM visited_urls WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Forgets every recorded URL
    pub fn clear(&self) -> StoreResult<()> {
        self.conn().execute("DELETE FROM visited_urls", [])?;
        Ok(())
    }
}

impl VisitedStore for SqliteStore {
    fn is_visited(&self, url: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM visited_urls WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn mark_visited(&self, url: &str) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT INTO visited_urls (url, first_visited_at, last_visited_at, visit_count)
             VALUES (?1, ?2, ?2, 1)
             ON CONFLICT(url) DO UPDATE SET
                last_visited_at = excluded.last_visited_at,
                visit_count = visit_count + 1",
            params![url, now],
        )?;
        Ok(())
    }
}
