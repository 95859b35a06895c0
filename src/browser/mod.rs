//! Browser capability interface
//!
//! The harvesting pipeline never talks to a browser library directly. It drives
//! a [`PageDriver`]: a single controllable page that can navigate, wait for and
//! query elements, read their attributes and text, and scroll.
//!
//! Two drivers are provided:
//! - [`ChromePage`]: a live Chrome/Chromium tab driven over CDP (chromiumoxide)
//! - [`SnapshotPage`]: saved HTML snapshots, one or more frames per URL, used for
//!   offline replay of the extraction logic and for tests
//!
//! Element lookups that find nothing return `None` or an empty `Vec`; only
//! transport failures, timeouts and bad selectors are errors.

mod chrome;
mod snapshot;

pub use chrome::{launch, BrowserSession, ChromePage, LaunchOptions};
pub use snapshot::{SnapshotNode, SnapshotPage};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a page driver
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {timeout:?} while {action}")]
    Timeout { action: String, timeout: Duration },

    #[error("Invalid selector '{0}'")]
    Selector(String),

    #[error("Stale element handle")]
    StaleElement,

    #[error("Browser protocol error: {0}")]
    Protocol(String),
}

/// Result type for page driver operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// A single controllable page bound to a browser session
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Handle to an element rendered on the current page
    type Node: Send + Sync;

    /// Navigates to `url`, failing if the load does not finish within `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> BrowserResult<()>;

    /// Waits until at least one element matches `selector`
    ///
    /// Returns `Ok(false)` if nothing matched before `timeout` elapsed.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> BrowserResult<bool>;

    /// All elements matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> BrowserResult<Vec<Self::Node>>;

    /// First element matching `selector` inside `scope`
    async fn query_in(&self, scope: &Self::Node, selector: &str)
        -> BrowserResult<Option<Self::Node>>;

    /// All elements matching `selector` inside `scope`, in document order
    async fn query_all_in(&self, scope: &Self::Node, selector: &str)
        -> BrowserResult<Vec<Self::Node>>;

    /// Value of attribute `name` on `node`
    async fn attribute(&self, node: &Self::Node, name: &str) -> BrowserResult<Option<String>>;

    /// Value of attribute `name` on the nearest element matching `selector`,
    /// starting at `node` itself and walking up its ancestors
    async fn closest_attribute(
        &self,
        node: &Self::Node,
        selector: &str,
        name: &str,
    ) -> BrowserResult<Option<String>>;

    /// Rendered text of `node`, one line per visual line
    async fn inner_text(&self, node: &Self::Node) -> BrowserResult<String>;

    /// Text of `node` gathered by walking its subtree: text nodes are
    /// concatenated and `<br>` elements become `\n`
    async fn text_with_breaks(&self, node: &Self::Node) -> BrowserResult<String>;

    /// Scrolls the viewport vertically by `dy` pixels
    async fn scroll_by(&self, dy: i64) -> BrowserResult<()>;

    /// URL of the current document, if any
    async fn current_url(&self) -> BrowserResult<Option<String>>;
}
