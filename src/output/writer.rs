//! Document writer for extracted records
//!
//! One markdown file per item, named after the author handle and item id.

use crate::harvester::{DocumentWriter, ExtractedRecord};
use crate::output::markdown::format_markdown;
use crate::output::{OutputError, OutputResult};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Replaces everything outside `[A-Za-z0-9-]` with `_`
///
/// Characters outside the Basic Multilingual Plane (most emoji) become two
/// underscores, one per UTF-16 code unit, so names match those produced by
/// earlier versions of the tool.
pub fn sanitize_file_stem(raw: &str) -> String {
    let mut stem = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            stem.push(c);
        } else {
            stem.extend(std::iter::repeat('_').take(c.len_utf16()));
        }
    }
    stem
}

/// Writes each record as `<handle>-<id>.md` under one directory
#[derive(Debug, Clone)]
pub struct MarkdownWriter {
    output_dir: PathBuf,
}

impl MarkdownWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the document for `record` is written to
    pub fn path_for(&self, record: &ExtractedRecord) -> PathBuf {
        let stem = sanitize_file_stem(&format!("{}-{}", record.author_handle, record.id));
        self.output_dir.join(format!("{}.md", stem))
    }
}

impl DocumentWriter for MarkdownWriter {
    fn write(&self, record: &ExtractedRecord) -> OutputResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.path_for(record);
        let content = format_markdown(record, Utc::now());
        std::fs::write(&path, content).map_err(|source| OutputError::Write {
            path: path.display().to_string(),
            source,
        })?;

        tracing::debug!("Saved: {}", path.display());
        Ok(path)
    }
}
