//! Database schema definitions
//!
//! This module contains the SQL schema for the persistent visited store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every URL that completed an HTTP round trip
CREATE TABLE IF NOT EXISTS visited_urls (
    url TEXT PRIMARY KEY,
    first_visited_at TEXT NOT NULL,
    last_visited_at TEXT NOT NULL,
    visit_count INTEGER NOT NULL DEFAULT 1
);
"#;

/// Initializes the database schema and stamps the schema version
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", get_schema_version())?;
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
