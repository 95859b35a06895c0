//! Storage module for the processed-item ledger
//!
//! This module handles all database operations for the harvester:
//! - SQLite database initialization and schema management
//! - The idempotency gate (`exists` / `record` / `count`)
//! - Statistics and recency queries for reporting

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteLedger;
pub use traits::{Ledger, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens (creating if needed) the ledger database at `path`
pub fn open_ledger(path: &Path) -> StorageResult<SqliteLedger> {
    SqliteLedger::open(path)
}

/// One processed item in the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: String,
    pub url: String,
    pub author_handle: String,
    pub author_name: String,
    pub file_path: String,
    /// `None` on insert lets the database stamp the insertion time
    pub scraped_at: Option<DateTime<Utc>>,
    pub has_media: bool,
    pub media_count: u32,
}

impl LedgerEntry {
    /// Builds an entry for a freshly saved item
    ///
    /// `has_media` is derived from `media_count`.
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        author_handle: impl Into<String>,
        author_name: impl Into<String>,
        file_path: impl Into<String>,
        media_count: u32,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            author_handle: author_handle.into(),
            author_name: author_name.into(),
            file_path: file_path.into(),
            scraped_at: None,
            has_media: media_count > 0,
            media_count,
        }
    }
}

/// Item count for one author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCount {
    pub author_handle: String,
    pub author_name: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_derives_media_flag() {
        let with_media = LedgerEntry::new("1", "u", "@a", "A", "f.md", 2);
        assert!(with_media.has_media);
        assert_eq!(with_media.media_count, 2);
        assert!(with_media.scraped_at.is_none());

        let without_media = LedgerEntry::new("2", "u", "@a", "A", "f.md", 0);
        assert!(!without_media.has_media);
    }
}
