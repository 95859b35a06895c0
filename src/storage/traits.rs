//! Storage traits and error types
//!
//! This module defines the trait interface for ledger backends and
//! associated error types.

use crate::storage::{AuthorCount, LedgerEntry};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of fully processed items
///
/// The pipeline only relies on `exists`, `record` and `count`; the remaining
/// queries back the statistics view.
pub trait Ledger {
    // ===== Idempotency Gate =====

    /// Returns true if an item with this id has already been processed
    fn exists(&self, id: &str) -> StorageResult<bool>;

    /// Records a processed item if its id is not already present
    ///
    /// # Returns
    ///
    /// `true` if a row was inserted, `false` if the id was already recorded.
    /// A duplicate is never an error: the first write wins.
    fn record(&mut self, entry: &LedgerEntry) -> StorageResult<bool>;

    /// Total number of recorded items
    fn count(&self) -> StorageResult<u64>;

    // ===== Statistics =====

    /// Number of recorded items carrying at least one media reference
    fn count_with_media(&self) -> StorageResult<u64>;

    /// Most recently recorded items, newest first
    fn recent(&self, limit: usize) -> StorageResult<Vec<LedgerEntry>>;

    /// Authors with the most recorded items, largest first
    fn top_authors(&self, limit: usize) -> StorageResult<Vec<AuthorCount>>;

    /// All recorded items for one author handle, newest first
    fn entries_by_author(&self, handle: &str) -> StorageResult<Vec<LedgerEntry>>;
}
