//! Extraction of one item from its detail view

use crate::browser::{BrowserError, PageDriver};
use crate::config::{Config, DelayRange};
use crate::harvester::pacing::Pacer;
use crate::harvester::parser::{
    append_quoted, normalize_date, split_author, strip_author_text, AUTHOR_SELECTOR,
    BODY_SELECTOR, ITEM_SELECTOR, PHOTO_SELECTOR, QUOTED_SELECTOR, TIME_SELECTOR, VIDEO_SELECTOR,
};
use crate::harvester::{ExtractedRecord, ItemReference};
use std::time::Duration;
use thiserror::Error;

/// Why an item could not be extracted
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no item rendered within {0:?}")]
    MissingItem(Duration),

    #[error("{0}")]
    Browser(#[from] BrowserError),
}

/// Reads structured content out of an item's detail view
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    navigation_timeout: Duration,
    detail_timeout: Duration,
    settle: DelayRange,
}

impl ContentExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            navigation_timeout: Duration::from_millis(config.timeouts.navigation_ms),
            detail_timeout: Duration::from_millis(config.timeouts.detail_ms),
            settle: config.pacing.settle,
        }
    }

    /// Extracts `item`, logging and swallowing any failure
    pub async fn extract<P: PageDriver>(
        &self,
        page: &P,
        pacer: &dyn Pacer,
        item: &ItemReference,
    ) -> Option<ExtractedRecord> {
        match self.try_extract(page, pacer, item).await {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Error extracting {}: {}", item.url, e);
                None
            }
        }
    }

    /// Navigates to the item's detail view and reads it
    ///
    /// Only navigation, the wait for the primary item and driver failures are
    /// errors. Missing author, date, body or media fall back to defaults.
    pub async fn try_extract<P: PageDriver>(
        &self,
        page: &P,
        pacer: &dyn Pacer,
        item: &ItemReference,
    ) -> Result<ExtractedRecord, ExtractError> {
        page.navigate(&item.url, self.navigation_timeout).await?;
        pacer.pause(self.settle).await;

        if !page.wait_for(ITEM_SELECTOR, self.detail_timeout).await? {
            return Err(ExtractError::MissingItem(self.detail_timeout));
        }
        let block = page
            .query_all(ITEM_SELECTOR)
            .await?
            .into_iter()
            .next()
            .ok_or(ExtractError::MissingItem(self.detail_timeout))?;

        let author_text = match page.query_in(&block, AUTHOR_SELECTOR).await? {
            Some(node) => page.inner_text(&node).await?,
            None => String::new(),
        };
        let (author_name, author_handle) = split_author(&author_text);

        let published_date = match page.query_in(&block, TIME_SELECTOR).await? {
            Some(node) => page
                .attribute(&node, "datetime")
                .await?
                .as_deref()
                .and_then(normalize_date),
            None => None,
        };

        let mut text = match page.query_in(&block, BODY_SELECTOR).await? {
            Some(node) => page.text_with_breaks(&node).await?.trim().to_string(),
            None => String::new(),
        };
        if text.is_empty() {
            let rendered = page.inner_text(&block).await.unwrap_or_else(|e| {
                tracing::debug!("No rendered text for {}: {}", item.url, e);
                String::new()
            });
            text = strip_author_text(&rendered, &author_text);
        }

        let mut media_urls = Vec::new();
        for img in page.query_all_in(&block, PHOTO_SELECTOR).await? {
            if let Some(src) = page.attribute(&img, "src").await? {
                media_urls.push(src);
            }
        }
        for video in page.query_all_in(&block, VIDEO_SELECTOR).await? {
            if let Some(poster) = page.attribute(&video, "poster").await? {
                media_urls.push(poster);
            }
        }

        if let Some(quoted) = page.query_in(&block, QUOTED_SELECTOR).await? {
            let quoted_text = page.inner_text(&quoted).await.unwrap_or_default();
            text = append_quoted(&text, &quoted_text);
        }

        Ok(ExtractedRecord {
            id: item.id.clone(),
            url: item.url.clone(),
            text,
            author_name,
            author_handle,
            published_date,
            media_urls,
        })
    }
}
