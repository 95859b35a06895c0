//! Output module for saved documents and ledger reports
//!
//! This module handles:
//! - Formatting an extracted record as a markdown note with front-matter
//! - Writing one document per item into the output directory
//! - Summarizing the ledger for the `stats` command

mod markdown;
pub mod stats;
mod writer;

pub use markdown::{extract_hashtags, format_markdown, summarize};
pub use stats::{load_statistics, print_statistics, LedgerStatistics};
pub use writer::{sanitize_file_stem, MarkdownWriter};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
