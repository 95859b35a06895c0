//! Statistics generation from the ledger
//!
//! This module provides functionality for extracting and displaying
//! what has been harvested so far.

use crate::storage::{AuthorCount, Ledger, LedgerEntry, StorageResult};

/// Number of authors and recent entries shown by default
pub const DEFAULT_REPORT_LIMIT: usize = 10;

/// Ledger statistics summary
#[derive(Debug, Clone)]
pub struct LedgerStatistics {
    /// Total number of processed items
    pub total: u64,

    /// Items that carried at least one media URL
    pub with_media: u64,

    /// Authors with the most saved items, most first
    pub top_authors: Vec<AuthorCount>,

    /// Most recently processed items, newest first
    pub recent: Vec<LedgerEntry>,
}

/// Loads statistics from the ledger
///
/// # Arguments
///
/// * `ledger` - The ledger to query
/// * `limit` - How many authors and recent entries to include
pub fn load_statistics(ledger: &dyn Ledger, limit: usize) -> StorageResult<LedgerStatistics> {
    Ok(LedgerStatistics {
        total: ledger.count()?,
        with_media: ledger.count_with_media()?,
        top_authors: ledger.top_authors(limit)?,
        recent: ledger.recent(limit)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &LedgerStatistics) {
    println!("=== Bookmark Statistics ===\n");

    println!("Overview:");
    println!("  Total items: {}", stats.total);
    let percentage = if stats.total > 0 {
        (stats.with_media as f64 / stats.total as f64) * 100.0
    } else {
        0.0
    };
    println!("  With media: {} ({:.1}%)", stats.with_media, percentage);
    println!();

    if !stats.top_authors.is_empty() {
        println!("Top Authors:");
        for author in &stats.top_authors {
            println!(
                "  {} ({}): {}",
                author.author_handle, author.author_name, author.count
            );
        }
        println!();
    }

    if !stats.recent.is_empty() {
        println!("Recently Saved:");
        for entry in &stats.recent {
            let when = entry
                .scraped_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("  [{}] {} {}", when, entry.author_handle, entry.url);
        }
    }
}
