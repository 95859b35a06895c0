//! Harvester module: the bookmark collection and extraction pipeline
//!
//! This module contains the core harvesting logic, including:
//! - Randomized pacing between remote interactions
//! - Scroll-collection of item references from the bookmarks list
//! - Extraction of a structured record from each item's detail view
//! - Orchestration of a run against the idempotency ledger

mod collector;
mod coordinator;
mod extractor;
mod pacing;
mod parser;

pub use collector::{CollectionError, UrlCollector};
pub use coordinator::{DocumentWriter, Orchestrator};
pub use extractor::{ContentExtractor, ExtractError};
pub use pacing::{pick_delay, HumanPacer, InstantPacer, Pacer};
pub use parser::{
    append_quoted, canonical_item_url, normalize_date, split_author, status_id_from_url,
    strip_author_text,
};

use crate::state::RunOutcome;
use chrono::NaiveDate;

/// A bookmarked item discovered in the list view
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemReference {
    /// Numeric status id, unique per item
    pub id: String,

    /// Absolute URL of the item's detail view
    pub url: String,
}

/// Structured content extracted from one item's detail view
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    pub id: String,
    pub url: String,
    /// Body text, with any quoted item appended; may be empty
    pub text: String,
    pub author_name: String,
    pub author_handle: String,
    pub published_date: Option<NaiveDate>,
    /// Photo sources followed by video poster frames
    pub media_urls: Vec<String>,
}

/// Summary of one harvesting run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Items extracted, written and recorded during this run
    pub saved: usize,
    /// Items already present in the ledger
    pub skipped: usize,
    /// Items whose extraction failed
    pub failed: usize,
    pub ledger_total_before: u64,
    pub ledger_total: u64,
}

impl RunReport {
    /// Report for a run that ended before processing any item
    pub fn early(outcome: RunOutcome, ledger_total: u64) -> Self {
        Self {
            outcome,
            saved: 0,
            skipped: 0,
            failed: 0,
            ledger_total_before: ledger_total,
            ledger_total,
        }
    }
}
