//! State module for tracking pipeline progress
//!
//! # Components
//!
//! - `PipelineState`: where a harvesting run currently is (auth check, collection,
//!   per-item extraction and persistence, or one of the terminal states)
//! - `RunOutcome`: how a finished run ended

mod pipeline_state;

// Re-export main types
pub use pipeline_state::{PipelineState, RunOutcome};
