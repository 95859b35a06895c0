//! Pure parsing helpers for the list and detail views
//!
//! Everything here works on strings and URLs already read from the page, so
//! the rules for identifiers, authors, dates and quoted items can be tested
//! without a browser.

use crate::harvester::ItemReference;
use chrono::NaiveDate;
use url::Url;

/// One rendered item, in both the list and the detail view
pub(crate) const ITEM_SELECTOR: &str = r#"article[data-testid="tweet"]"#;

/// Timestamp element; its enclosing anchor links to the detail view
pub(crate) const TIME_SELECTOR: &str = "time";

pub(crate) const TIME_LINK_SELECTOR: &str = "a";

pub(crate) const AUTHOR_SELECTOR: &str = r#"div[data-testid="User-Name"]"#;

pub(crate) const BODY_SELECTOR: &str = r#"div[data-testid="tweetText"]"#;

pub(crate) const PHOTO_SELECTOR: &str = r#"div[data-testid="tweetPhoto"] img"#;

pub(crate) const VIDEO_SELECTOR: &str = "video";

/// Embedded quoted item inside the primary block
pub(crate) const QUOTED_SELECTOR: &str = r#"div[role="link"]"#;

pub(crate) const DEFAULT_AUTHOR_NAME: &str = "Unknown";

pub(crate) const DEFAULT_AUTHOR_HANDLE: &str = "@unknown";

/// Extracts the numeric id from a `/status/<digits>` path segment
///
/// # Example
///
/// ```
/// use bookmark_harvester::harvester::status_id_from_url;
/// use url::Url;
///
/// let url = Url::parse("https://x.com/rustlang/status/1790000000000000001").unwrap();
/// assert_eq!(status_id_from_url(&url).as_deref(), Some("1790000000000000001"));
/// ```
pub fn status_id_from_url(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment == "status" {
            return segments
                .next()
                .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
                .map(str::to_string);
        }
    }
    None
}

/// Resolves an item link against the site and derives its reference
///
/// The query string and fragment are dropped. Returns None when the link
/// does not resolve or carries no status id.
///
/// # Arguments
///
/// * `base` - The site base URL
/// * `href` - The link as found in the page, relative or absolute
pub fn canonical_item_url(base: &Url, href: &str) -> Option<ItemReference> {
    let mut url = base.join(href.trim()).ok()?;
    url.set_query(None);
    url.set_fragment(None);

    let id = status_id_from_url(&url)?;
    Some(ItemReference {
        id,
        url: url.to_string(),
    })
}

/// Splits the rendered author block into display name and handle
///
/// The name is the first line; the handle is the first line starting with
/// `@`. Missing parts fall back to `Unknown` and `@unknown`.
pub fn split_author(raw: &str) -> (String, String) {
    let mut lines = raw.lines().map(str::trim);

    let name = lines
        .next()
        .filter(|line| !line.is_empty())
        .unwrap_or(DEFAULT_AUTHOR_NAME)
        .to_string();

    let handle = raw
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('@'))
        .unwrap_or(DEFAULT_AUTHOR_HANDLE)
        .to_string();

    (name, handle)
}

/// Truncates a `datetime` attribute to its calendar date
///
/// Returns None for empty or malformed values.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let date = raw.trim().split('T').next()?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Removes the author block's text from a block's rendered text
pub fn strip_author_text(block_text: &str, author_text: &str) -> String {
    if author_text.is_empty() {
        return block_text.trim().to_string();
    }
    block_text.replacen(author_text, "", 1).trim().to_string()
}

/// Appends a quoted item to the body as a markdown blockquote
///
/// Nothing is appended when the quoted text is empty or already part of the body.
pub fn append_quoted(body: &str, quoted: &str) -> String {
    if quoted.is_empty() || body.contains(quoted) {
        return body.to_string();
    }

    let quoted_lines = quoted.split('\n').collect::<Vec<_>>().join("\n> ");
    format!("{}\n\n> Quoted Tweet:\n> {}", body, quoted_lines)
}
