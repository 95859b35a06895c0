//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Ledger trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Ledger, StorageResult};
use crate::storage::{AuthorCount, LedgerEntry};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;

const ENTRY_COLUMNS: &str =
    "id, url, author_handle, author_name, file_path, scraped_at, has_media, media_count";

/// SQLite ledger backend
///
/// Owns a single connection for the lifetime of one run; dropping it (or
/// calling [`SqliteLedger::close`]) releases the database.
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Opens or creates the ledger database at `path`
    ///
    /// Missing parent directories are created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory ledger (for tests and dry runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Closes the underlying connection, surfacing any final error
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    fn query_entries<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> StorageResult<Vec<LedgerEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let scraped_at: Option<String> = row.get(5)?;
    Ok(LedgerEntry {
        id: row.get(0)?,
        url: row.get(1)?,
        author_handle: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        author_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        file_path: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        scraped_at: scraped_at.and_then(|s| s.parse::<DateTime<Utc>>().ok()),
        has_media: row.get(6)?,
        media_count: row.get(7)?,
    })
}

impl Ledger for SqliteLedger {
    // ===== Idempotency Gate =====

    fn exists(&self, id: &str) -> StorageResult<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM scraped_items WHERE id = ?1")?;
        Ok(stmt.exists(params![id])?)
    }

    fn record(&mut self, entry: &LedgerEntry) -> StorageResult<bool> {
        let inserted = match entry.scraped_at {
            Some(at) => self.conn.execute(
                "INSERT OR IGNORE INTO scraped_items
                 (id, url, author_handle, author_name, file_path, scraped_at, has_media, media_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.id,
                    entry.url,
                    entry.author_handle,
                    entry.author_name,
                    entry.file_path,
                    at.to_rfc3339_opts(SecondsFormat::Millis, true),
                    entry.media_count > 0,
                    entry.media_count
                ],
            )?,
            None => self.conn.execute(
                "INSERT OR IGNORE INTO scraped_items
                 (id, url, author_handle, author_name, file_path, has_media, media_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.id,
                    entry.url,
                    entry.author_handle,
                    entry.author_name,
                    entry.file_path,
                    entry.media_count > 0,
                    entry.media_count
                ],
            )?,
        };

        Ok(inserted > 0)
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scraped_items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Statistics =====

    fn count_with_media(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM scraped_items WHERE has_media = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn recent(&self, limit: usize) -> StorageResult<Vec<LedgerEntry>> {
        self.query_entries(
            &format!(
                "SELECT {} FROM scraped_items ORDER BY scraped_at DESC, rowid DESC LIMIT ?1",
                ENTRY_COLUMNS
            ),
            params![limit as i64],
        )
    }

    fn top_authors(&self, limit: usize) -> StorageResult<Vec<AuthorCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT author_handle, MAX(author_name), COUNT(*) as count
             FROM scraped_items
             GROUP BY author_handle
             ORDER BY count DESC, author_handle ASC
             LIMIT ?1",
        )?;

        let authors = stmt
            .query_map(params![limit as i64], |row| {
                Ok(AuthorCount {
                    author_handle: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    author_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    count: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(authors)
    }

    fn entries_by_author(&self, handle: &str) -> StorageResult<Vec<LedgerEntry>> {
        self.query_entries(
            &format!(
                "SELECT {} FROM scraped_items WHERE author_handle = ?1
                 ORDER BY scraped_at DESC, rowid DESC",
                ENTRY_COLUMNS
            ),
            params![handle],
        )
    }
}
