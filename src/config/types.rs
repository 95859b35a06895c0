use serde::Deserialize;

/// Main configuration structure for Bookmark Harvester
///
/// Every table is optional in the TOML file; missing tables and keys fall back
/// to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub browser: BrowserConfig,
    pub collector: CollectorConfig,
    pub pacing: PacingConfig,
    pub timeouts: TimeoutConfig,
    pub output: OutputConfig,
}

/// Where the remote site lives and which views the pipeline visits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin of the site, used to resolve relative item links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Home timeline path, used to verify the session
    #[serde(rename = "home-path")]
    pub home_path: String,

    /// Bookmarks listing path
    #[serde(rename = "bookmarks-path")]
    pub bookmarks_path: String,

    /// Interactive login flow path
    #[serde(rename = "login-path")]
    pub login_path: String,
}

impl SiteConfig {
    /// Joins a site-relative path onto the configured base URL
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn home_url(&self) -> String {
        self.url_for(&self.home_path)
    }

    pub fn bookmarks_url(&self) -> String {
        self.url_for(&self.bookmarks_path)
    }

    pub fn login_url(&self) -> String {
        self.url_for(&self.login_path)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://x.com".to_string(),
            home_path: "/home".to_string(),
            bookmarks_path: "/i/bookmarks".to_string(),
            login_path: "/i/flow/login".to_string(),
        }
    }
}

/// Browser launch and session persistence settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run the scraping browser without a window
    pub headless: bool,

    /// JSON file holding the saved session cookies
    #[serde(rename = "session-path")]
    pub session_path: String,

    /// User agent presented by the login browser
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "window-width")]
    pub window_width: u32,

    #[serde(rename = "window-height")]
    pub window_height: u32,

    /// Explicit Chrome/Chromium binary; auto-detected when absent
    pub executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            session_path: "storage-state.json".to_string(),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36"
                .to_string(),
            window_width: 1280,
            window_height: 720,
            executable: None,
        }
    }
}

/// Scroll-collection behavior for the bookmarks list
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Upper bound on scroll iterations per collection
    #[serde(rename = "max-scroll-attempts")]
    pub max_scroll_attempts: u32,

    /// Consecutive iterations without a new item tolerated before stopping
    #[serde(rename = "stagnation-threshold")]
    pub stagnation_threshold: u32,

    /// Pixels scrolled between iterations
    #[serde(rename = "scroll-increment")]
    pub scroll_increment: i64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_scroll_attempts: 30,
            stagnation_threshold: 5,
            scroll_increment: 1000,
        }
    }
}

/// An inclusive millisecond range for randomized pauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    #[serde(rename = "min-ms")]
    pub min_ms: u64,

    #[serde(rename = "max-ms")]
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

/// Human-cadence pauses between remote interactions
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Pause after each scroll of the bookmarks list
    pub scroll: DelayRange,

    /// Pause after opening a detail view, letting dynamic content settle
    pub settle: DelayRange,

    /// Pause between two processed items
    #[serde(rename = "between-items")]
    pub between_items: DelayRange,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            scroll: DelayRange::new(1500, 2500),
            settle: DelayRange::new(2000, 4000),
            between_items: DelayRange::new(3000, 5000),
        }
    }
}

/// Per-step timeouts (milliseconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Detail view navigation
    #[serde(rename = "navigation-ms")]
    pub navigation_ms: u64,

    /// Home view navigation during session verification
    #[serde(rename = "auth-navigation-ms")]
    pub auth_navigation_ms: u64,

    /// Wait for the home view content marker
    #[serde(rename = "auth-marker-ms")]
    pub auth_marker_ms: u64,

    /// Wait for the first bookmarks list item
    #[serde(rename = "list-ms")]
    pub list_ms: u64,

    /// Wait for the primary item on a detail view
    #[serde(rename = "detail-ms")]
    pub detail_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation_ms: 30_000,
            auth_navigation_ms: 10_000,
            auth_marker_ms: 5_000,
            list_ms: 15_000,
            detail_ms: 10_000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite ledger file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory receiving one markdown document per item
    #[serde(rename = "output-dir")]
    pub output_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "pipeline.db".to_string(),
            output_dir: "output".to_string(),
        }
    }
}
