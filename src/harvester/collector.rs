//! Scroll-collection of item references from the bookmarks list
//!
//! The list renders lazily and re-renders items it has already shown, so the
//! collector enumerates whatever is on screen, deduplicates by status id,
//! scrolls, and repeats until it has enough items, the list stops producing
//! new ones, or the attempt cap is reached.

use crate::browser::{BrowserError, PageDriver};
use crate::config::{Config, CollectorConfig, DelayRange};
use crate::harvester::pacing::Pacer;
use crate::harvester::parser::{canonical_item_url, ITEM_SELECTOR, TIME_LINK_SELECTOR, TIME_SELECTOR};
use crate::harvester::ItemReference;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that end a collection
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("no items visible after {0:?}; the session is likely unauthenticated or the list is empty")]
    NoItemsVisible(Duration),

    #[error("{0}")]
    Browser(#[from] BrowserError),
}

/// Collects up to N distinct item references from a list view
#[derive(Debug, Clone)]
pub struct UrlCollector {
    base_url: Url,
    settings: CollectorConfig,
    scroll_pause: DelayRange,
    list_timeout: Duration,
}

impl UrlCollector {
    /// Builds a collector from the run configuration
    ///
    /// Fails only if the configured base URL does not parse.
    pub fn new(config: &Config) -> crate::Result<Self> {
        Ok(Self {
            base_url: Url::parse(&config.site.base_url)?,
            settings: config.collector.clone(),
            scroll_pause: config.pacing.scroll,
            list_timeout: Duration::from_millis(config.timeouts.list_ms),
        })
    }

    /// Collects item references from the list view the page is showing
    ///
    /// # Arguments
    ///
    /// * `page` - A page already navigated to the list view
    /// * `pacer` - Pauses after every scroll
    /// * `max_items` - Upper bound on returned references
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ItemReference>)` - Distinct references in first-seen order;
    ///   fewer than `max_items` when the list ran out
    /// * `Err(CollectionError)` - No item became visible, or the page failed
    pub async fn collect<P: PageDriver>(
        &self,
        page: &P,
        pacer: &dyn Pacer,
        max_items: usize,
    ) -> Result<Vec<ItemReference>, CollectionError> {
        if max_items == 0 {
            return Ok(Vec::new());
        }

        if !page.wait_for(ITEM_SELECTOR, self.list_timeout).await? {
            return Err(CollectionError::NoItemsVisible(self.list_timeout));
        }

        let mut seen = HashSet::new();
        let mut collected = Vec::new();
        let mut stagnant_iterations = 0;

        for attempt in 0..self.settings.max_scroll_attempts {
            let new_items = self
                .collect_visible(page, max_items, &mut seen, &mut collected)
                .await?;

            if collected.len() >= max_items {
                tracing::debug!("Reached {} items after {} scrolls", max_items, attempt);
                break;
            }

            if new_items == 0 {
                stagnant_iterations += 1;
                if stagnant_iterations > self.settings.stagnation_threshold {
                    tracing::info!("No new items found, stopping collection");
                    break;
                }
            } else {
                stagnant_iterations = 0;
            }

            page.scroll_by(self.settings.scroll_increment).await?;
            pacer.pause(self.scroll_pause).await;
        }

        tracing::info!("Collected {} item URLs", collected.len());
        Ok(collected)
    }

    /// Adds every new reference currently on screen; returns how many were new
    async fn collect_visible<P: PageDriver>(
        &self,
        page: &P,
        max_items: usize,
        seen: &mut HashSet<String>,
        collected: &mut Vec<ItemReference>,
    ) -> Result<usize, CollectionError> {
        let mut new_items = 0;

        for node in page.query_all(ITEM_SELECTOR).await? {
            if collected.len() >= max_items {
                break;
            }

            match self.reference_for(page, &node).await {
                Ok(Some(item)) => {
                    if seen.insert(item.id.clone()) {
                        tracing::info!("Collected: {}", item.url);
                        collected.push(item);
                        new_items += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Skipping unreadable list item: {}", e),
            }
        }

        Ok(new_items)
    }

    /// Reads the detail link of one rendered item
    async fn reference_for<P: PageDriver>(
        &self,
        page: &P,
        node: &P::Node,
    ) -> Result<Option<ItemReference>, BrowserError> {
        let time = match page.query_in(node, TIME_SELECTOR).await? {
            Some(time) => time,
            None => return Ok(None),
        };

        let href = page
            .closest_attribute(&time, TIME_LINK_SELECTOR, "href")
            .await?;

        Ok(href.and_then(|href| canonical_item_url(&self.base_url, &href)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::SnapshotPage;
    use crate::harvester::pacing::InstantPacer;

    const LIST_URL: &str = "https://x.com/i/bookmarks";

    fn article(handle: &str, id: u64) -> String {
        format!(
            r#"<article data-testid="tweet"><div data-testid="User-Name"><span>{h}</span></div><a href="/{h}/status/{id}"><time datetime="2024-05-14T10:00:00.000Z">May 14</time></a></article>"#,
            h = handle,
            id = id
        )
    }

    fn frame(ids: &[u64]) -> String {
        let items: String = ids.iter().map(|id| article("user", *id)).collect();
        format!("<html><body><main>{}</main></body></html>", items)
    }

    async fn list_page(frames: Vec<String>) -> SnapshotPage {
        let page = SnapshotPage::new().with_frames(LIST_URL, frames);
        page.navigate(LIST_URL, Duration::from_secs(1)).await.unwrap();
        page
    }

    fn collector(max_scroll_attempts: u32, stagnation_threshold: u32) -> UrlCollector {
        let mut config = Config::default();
        config.collector.max_scroll_attempts = max_scroll_attempts;
        config.collector.stagnation_threshold = stagnation_threshold;
        UrlCollector::new(&config).unwrap()
    }

    fn ids(items: &[ItemReference]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_stops_at_quota() {
        let page = list_page(vec![frame(&[1, 2, 3, 4, 5])]).await;
        let pacer = InstantPacer::new();

        let items = collector(30, 5).collect(&page, &pacer, 3).await.unwrap();

        assert_eq!(ids(&items), vec!["1", "2", "3"]);
        assert_eq!(items[0].url, "https://x.com/user/status/1");
        assert_eq!(page.scroll_count(), 0);
        assert!(pacer.requested().is_empty());
    }

    #[tokio::test]
    async fn test_dedups_across_rerendered_frames() {
        let page = list_page(vec![frame(&[1, 2]), frame(&[2, 3]), frame(&[3, 4])]).await;
        let pacer = InstantPacer::new();

        let items = collector(30, 5).collect(&page, &pacer, 4).await.unwrap();

        assert_eq!(ids(&items), vec!["1", "2", "3", "4"]);
        assert_eq!(page.scroll_count(), 2);
        assert_eq!(pacer.count_of(Config::default().pacing.scroll), 2);
    }

    #[tokio::test]
    async fn test_short_list_ends_by_stagnation() {
        let page = list_page(vec![frame(&[1, 2])]).await;
        let pacer = InstantPacer::new();

        let items = collector(30, 5).collect(&page, &pacer, 10).await.unwrap();

        assert_eq!(ids(&items), vec!["1", "2"]);
        // One productive iteration, then six empty ones; the last stops before scrolling
        assert_eq!(page.scroll_count(), 6);
    }

    #[tokio::test]
    async fn test_stagnation_counter_resets_on_new_item() {
        let mut frames: Vec<String> = (0..6).map(|_| frame(&[1])).collect();
        frames.push(frame(&[1, 2]));
        let page = list_page(frames).await;

        let items = collector(30, 5)
            .collect(&page, &InstantPacer::new(), 10)
            .await
            .unwrap();

        // Five empty iterations, a late item, then six more empty ones
        assert_eq!(ids(&items), vec!["1", "2"]);
        assert_eq!(page.scroll_count(), 12);
    }

    #[tokio::test]
    async fn test_attempt_cap_bounds_scrolling() {
        let frames = (0..10).map(|n| frame(&[n * 2, n * 2 + 1])).collect();
        let page = list_page(frames).await;
        let pacer = InstantPacer::new();

        let items = collector(3, 5).collect(&page, &pacer, 100).await.unwrap();

        assert_eq!(items.len(), 6);
        assert_eq!(page.scroll_count(), 3);
    }

    #[tokio::test]
    async fn test_skips_items_without_status_link() {
        let html = format!(
            r#"<main><article data-testid="tweet"><span>Promoted</span></article><article data-testid="tweet"><a href="/user/likes"><time>now</time></a></article>{}</main>"#,
            article("user", 9)
        );
        let page = list_page(vec![html]).await;

        let items = collector(30, 5)
            .collect(&page, &InstantPacer::new(), 1)
            .await
            .unwrap();

        assert_eq!(ids(&items), vec!["9"]);
    }

    #[tokio::test]
    async fn test_no_visible_items_is_error() {
        let page = list_page(vec!["<main><p>Save posts for later</p></main>".to_string()]).await;

        let result = collector(30, 5).collect(&page, &InstantPacer::new(), 5).await;

        assert!(matches!(result, Err(CollectionError::NoItemsVisible(_))));
    }
}
