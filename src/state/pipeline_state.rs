/// Pipeline state definitions for tracking a harvesting run
///
/// A run moves through `VerifyingAuth → Collecting`, then loops
/// `ExtractingItem(i) → Persisting(i) → NextItem` over the collected items,
/// and always ends in one of the `Done*` states.
use std::fmt;

/// Represents the current state of a harvesting run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    // ===== Active States =====
    /// Checking that the restored session reaches the home view
    VerifyingAuth,

    /// Scrolling the bookmarks list and gathering item references
    Collecting,

    /// Extracting the item at this index from its detail view
    ExtractingItem(usize),

    /// Writing the item at this index and recording it in the ledger
    Persisting(usize),

    /// Moving on from the item just handled
    NextItem,

    // ===== Terminal States =====
    /// Every collected item was handled
    DoneSuccess,

    /// The session is not authenticated
    DoneAuthFailed,

    /// The bookmarks list yielded nothing to process
    DoneNoItems,
}

impl PipelineState {
    /// Returns true if this is a terminal state (the run is over)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::DoneSuccess | Self::DoneAuthFailed | Self::DoneNoItems
        )
    }

    /// Index of the item being worked on, if any
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Self::ExtractingItem(i) | Self::Persisting(i) => Some(*i),
            _ => None,
        }
    }

    /// The outcome a terminal state stands for
    ///
    /// Returns None for active states.
    pub fn outcome(&self) -> Option<RunOutcome> {
        match self {
            Self::DoneSuccess => Some(RunOutcome::Success),
            Self::DoneAuthFailed => Some(RunOutcome::AuthFailed),
            Self::DoneNoItems => Some(RunOutcome::NoItems),
            _ => None,
        }
    }

    /// Short machine-friendly name of the state, without the item index
    pub fn name(&self) -> &'static str {
        match self {
            Self::VerifyingAuth => "verifying_auth",
            Self::Collecting => "collecting",
            Self::ExtractingItem(_) => "extracting_item",
            Self::Persisting(_) => "persisting",
            Self::NextItem => "next_item",
            Self::DoneSuccess => "done_success",
            Self::DoneAuthFailed => "done_auth_failed",
            Self::DoneNoItems => "done_no_items",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item_index() {
            Some(i) => write!(f, "{}({})", self.name(), i),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// How a harvesting run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    Success,
    AuthFailed,
    NoItems,
}

impl RunOutcome {
    /// The terminal pipeline state for this outcome
    pub fn terminal_state(&self) -> PipelineState {
        match self {
            Self::Success => PipelineState::DoneSuccess,
            Self::AuthFailed => PipelineState::DoneAuthFailed,
            Self::NoItems => PipelineState::DoneNoItems,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AuthFailed => "auth_failed",
            Self::NoItems => "no_items",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
