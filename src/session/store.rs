//! Session cookie file
//!
//! Cookies are stored as a pretty-printed JSON array; `httpOnly` is accepted
//! as an alias so files saved by other tools load too.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A browser cookie as written to the session file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, alias = "httpOnly")]
    pub http_only: bool,
    /// Expiry in seconds since the epoch; `None` for session cookies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
}

fn default_path() -> String {
    "/".to_string()
}

/// Reads the cookies saved at `path`
pub fn load_cookies(path: &Path) -> Result<Vec<StoredCookie>> {
    let content = std::fs::read_to_string(path)?;
    let cookies = serde_json::from_str(&content)?;
    Ok(cookies)
}

/// Writes `cookies` to `path`, replacing any previous session
pub fn save_cookies(path: &Path, cookies: &[StoredCookie]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(cookies)?;
    std::fs::write(path, content)?;
    Ok(())
}
