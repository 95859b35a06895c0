//! Configuration module for Bookmark Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All tables are optional; an absent file yields [`Config::default`].
//!
//! # Example
//!
//! ```no_run
//! use bookmark_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Ledger lives at: {}", config.output.database_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, CollectorConfig, Config, DelayRange, OutputConfig, PacingConfig, SiteConfig,
    TimeoutConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
