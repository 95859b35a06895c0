//! Bookmark Harvester: a paced bookmark archiver
//!
//! This crate drives an authenticated browser session through a bookmarks list,
//! extracts each bookmarked post from its detail view, writes it out as a markdown
//! document, and keeps a SQLite ledger so that re-runs never process an item twice.

pub mod browser;
pub mod config;
pub mod harvester;
pub mod output;
pub mod session;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Bookmark Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Collection error: {0}")]
    Collection(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Bookmark Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvester::{ExtractedRecord, ItemReference, RunReport};
pub use state::{PipelineState, RunOutcome};
pub use storage::{Ledger, LedgerEntry, SqliteLedger};
