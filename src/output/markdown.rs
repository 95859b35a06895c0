//! Markdown document generation
//!
//! Each saved item becomes a note with YAML front-matter (title, source,
//! author, dates, summary, tags and empty triage fields) followed by the body
//! and one image line per media URL.

use crate::harvester::ExtractedRecord;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Characters of body text kept in the summary
const SUMMARY_CHARS: usize = 150;

/// Characters of summary kept in the title
const TITLE_CHARS: usize = 50;

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#((?-u:\w)+)").expect("hashtag pattern is valid")
});

/// Tag used when the body carries no hashtags
const DEFAULT_TAG: &str = "twitter-bookmark";

/// Formats a record as a markdown document
///
/// # Arguments
///
/// * `record` - The extracted item
/// * `now` - Time of saving; fills `created`, `updated` and a missing `published`
///
/// # Returns
///
/// The complete document text
pub fn format_markdown(record: &ExtractedRecord, now: DateTime<Utc>) -> String {
    let today = now.format("%Y-%m-%d").to_string();
    let updated = now.format("%Y-%m-%dT%H:%M").to_string();
    let published = record
        .published_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| today.clone());

    let summary = summarize(&record.text);
    let title_summary: String = summary.chars().take(TITLE_CHARS).collect();

    let hashtags = extract_hashtags(&record.text);
    let tags = if hashtags.is_empty() {
        format!("  - {}", DEFAULT_TAG)
    } else {
        hashtags
            .iter()
            .map(|t| format!("  - {}", t))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let media = record
        .media_urls
        .iter()
        .map(|url| format!("![]({})", url))
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&format!(
        "title: {} on X: \"{}...\"\n",
        record.author_name, title_summary
    ));
    md.push_str("aliases:\n");
    md.push_str(&format!("created: {}\n", today));
    md.push_str(&format!("source: {}\n", record.url));
    md.push_str("author:\n");
    md.push_str(&format!("  - \"{}\"\n", record.author_handle));
    md.push_str(&format!("published: {}\n", published));
    md.push_str(&format!("summary: {}\n", summary));
    md.push_str("tags:\n");
    md.push_str(&tags);
    md.push('\n');
    md.push_str("status: inbox\n");
    md.push_str("insight:\n");
    md.push_str("project:\n");
    md.push_str("category:\n");
    md.push_str("area:\n");
    md.push_str(&format!("updated: {}\n", updated));
    md.push_str("---\n");
    md.push_str(&record.text);
    md.push_str("\n\n");
    md.push_str(&media);
    md.push('\n');

    md
}

/// First 150 characters of `text` on one line, with `...` when truncated
pub fn summarize(text: &str) -> String {
    let mut summary: String = text
        .chars()
        .take(SUMMARY_CHARS)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    if text.chars().count() > SUMMARY_CHARS {
        summary.push_str("...");
    }
    summary
}

/// Hashtags in `text`, without the `#`, in order of appearance
///
/// A tag is `#` followed by one or more ASCII letters, digits or underscores.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}
