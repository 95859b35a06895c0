//! Database schema definitions
//!
//! This module contains the SQL schema for the processed-item ledger.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per fully processed item
CREATE TABLE IF NOT EXISTS scraped_items (
    id TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    author_handle TEXT,
    author_name TEXT,
    scraped_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    file_path TEXT,
    has_media INTEGER NOT NULL DEFAULT 0,
    media_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_scraped_at ON scraped_items(scraped_at DESC);
CREATE INDEX IF NOT EXISTS idx_author ON scraped_items(author_handle);
"#;

/// Initializes the database schema
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
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_indexes_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for index in ["idx_scraped_at", "idx_author"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name=?1",
                    [index],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Index {} should exist", index);
        }
    }

    #[test]
    fn test_scraped_at_defaults_to_insertion_time() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO scraped_items (id, url) VALUES ('1', 'https://x.com/a/status/1')",
            [],
        )
        .unwrap();

        let scraped_at: String = conn
            .query_row("SELECT scraped_at FROM scraped_items WHERE id = '1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(scraped_at.parse::<chrono::DateTime<chrono::Utc>>().is_ok());
    }
}
