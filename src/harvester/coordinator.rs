//! Pipeline orchestration for one harvesting run
//!
//! The orchestrator owns the ledger for the duration of the run and drives:
//! - Session verification against the home view
//! - Collection of item references from the bookmarks list
//! - Per-item ledger check, extraction, document write and ledger record
//! - Pacing between processed items

use crate::browser::PageDriver;
use crate::config::{Config, DelayRange, SiteConfig};
use crate::harvester::collector::UrlCollector;
use crate::harvester::extractor::ContentExtractor;
use crate::harvester::pacing::Pacer;
use crate::harvester::parser::ITEM_SELECTOR;
use crate::harvester::{ExtractedRecord, ItemReference, RunReport};
use crate::output::OutputResult;
use crate::state::{PipelineState, RunOutcome};
use crate::storage::{Ledger, LedgerEntry};
use crate::HarvestError;
use std::path::PathBuf;
use std::time::Duration;

/// Persists an extracted record, returning where it was written
pub trait DocumentWriter: Send + Sync {
    fn write(&self, record: &ExtractedRecord) -> OutputResult<PathBuf>;
}

/// Runs the harvesting pipeline over one page
pub struct Orchestrator<'a, P: PageDriver, L: Ledger> {
    page: &'a P,
    ledger: L,
    writer: &'a dyn DocumentWriter,
    pacer: &'a dyn Pacer,
    collector: UrlCollector,
    extractor: ContentExtractor,
    site: SiteConfig,
    navigation_timeout: Duration,
    auth_navigation_timeout: Duration,
    auth_marker_timeout: Duration,
    between_items: DelayRange,
    state: PipelineState,
}

impl<'a, P: PageDriver, L: Ledger> Orchestrator<'a, P, L> {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `page` - The page every remote step is driven through
    /// * `ledger` - The opened ledger; owned until [`Orchestrator::into_ledger`]
    /// * `writer` - Destination for extracted records
    /// * `pacer` - Source of pauses between remote interactions
    pub fn new(
        config: &Config,
        page: &'a P,
        ledger: L,
        writer: &'a dyn DocumentWriter,
        pacer: &'a dyn Pacer,
    ) -> Result<Self, HarvestError> {
        Ok(Self {
            page,
            ledger,
            writer,
            pacer,
            collector: UrlCollector::new(config)?,
            extractor: ContentExtractor::new(config),
            site: config.site.clone(),
            navigation_timeout: Duration::from_millis(config.timeouts.navigation_ms),
            auth_navigation_timeout: Duration::from_millis(config.timeouts.auth_navigation_ms),
            auth_marker_timeout: Duration::from_millis(config.timeouts.auth_marker_ms),
            between_items: config.pacing.between_items,
            state: PipelineState::VerifyingAuth,
        })
    }

    /// Current pipeline state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Ends the orchestrator's ownership of the ledger
    pub fn into_ledger(self) -> L {
        self.ledger
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::trace!("Pipeline state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Moves to the terminal state for `outcome`
    fn conclude(&mut self, outcome: RunOutcome) -> RunOutcome {
        self.transition(outcome.terminal_state());
        debug_assert!(self.state.is_terminal());
        debug_assert_eq!(self.state.outcome(), Some(outcome));
        outcome
    }

    /// Runs the pipeline for up to `max_items` bookmarks
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run finished; see `outcome` for how
    /// * `Err(HarvestError)` - Collection failed, or the ledger or output
    ///   directory could not be used
    pub async fn run(&mut self, max_items: usize) -> Result<RunReport, HarvestError> {
        self.transition(PipelineState::VerifyingAuth);
        tracing::info!("Verifying authentication...");

        if !self.verify_auth().await {
            let outcome = self.conclude(RunOutcome::AuthFailed);
            tracing::error!(
                "Authentication failed. Please run \"bookmark-harvester auth\" first."
            );
            return Ok(RunReport::early(outcome, self.ledger.count()?));
        }
        tracing::info!("Authentication verified");

        let ledger_total_before = self.ledger.count()?;
        tracing::info!("Ledger: {} items already processed", ledger_total_before);

        self.transition(PipelineState::Collecting);
        let items = match self.collect(max_items).await {
            Ok(items) => items,
            Err(e) => {
                self.conclude(RunOutcome::AuthFailed);
                tracing::error!("Collection failed: {}", e);
                return Err(e);
            }
        };

        if items.is_empty() {
            let outcome = self.conclude(RunOutcome::NoItems);
            tracing::info!("No items found to process");
            return Ok(RunReport::early(outcome, ledger_total_before));
        }

        tracing::info!("Extracting content for {} items...", items.len());

        let total = items.len();
        let mut saved = 0;
        let mut skipped = 0;
        let mut failed = 0;
        let mut processed_any = false;

        for (i, item) in items.iter().enumerate() {
            self.transition(PipelineState::ExtractingItem(i));

            if self.ledger.exists(&item.id)? {
                tracing::info!("[{}/{}] Skipping (already processed): {}", i + 1, total, item.id);
                skipped += 1;
                self.transition(PipelineState::NextItem);
                continue;
            }

            if processed_any {
                self.pacer.pause(self.between_items).await;
            }
            processed_any = true;

            tracing::info!("[{}/{}] Processing: {}", i + 1, total, item.url);

            match self.extractor.extract(self.page, self.pacer, item).await {
                Some(record) => {
                    self.transition(PipelineState::Persisting(i));
                    self.persist(&record)?;
                    saved += 1;
                }
                None => {
                    tracing::warn!("Skipped {} due to extraction error", item.url);
                    failed += 1;
                }
            }

            self.transition(PipelineState::NextItem);
        }

        let outcome = self.conclude(RunOutcome::Success);
        let ledger_total = self.ledger.count()?;
        tracing::info!(
            "Done: {} new, {} already processed, {} failed; {} in ledger",
            saved,
            skipped,
            failed,
            ledger_total
        );

        Ok(RunReport {
            outcome,
            saved,
            skipped,
            failed,
            ledger_total_before,
            ledger_total,
        })
    }

    /// Checks that the home view renders items for this session
    async fn verify_auth(&self) -> bool {
        let home = self.site.home_url();
        if let Err(e) = self.page.navigate(&home, self.auth_navigation_timeout).await {
            tracing::debug!("Home view did not load: {}", e);
            return false;
        }

        match self.page.wait_for(ITEM_SELECTOR, self.auth_marker_timeout).await {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!("Home view check failed: {}", e);
                false
            }
        }
    }

    async fn collect(&self, max_items: usize) -> Result<Vec<ItemReference>, HarvestError> {
        tracing::info!("Collecting item URLs from bookmarks...");
        self.page
            .navigate(&self.site.bookmarks_url(), self.navigation_timeout)
            .await?;

        self.collector
            .collect(self.page, self.pacer, max_items)
            .await
            .map_err(|e| HarvestError::Collection(e.to_string()))
    }

    /// Writes the document, then records it in the ledger
    fn persist(&mut self, record: &ExtractedRecord) -> Result<(), HarvestError> {
        let path = self.writer.write(record)?;

        let entry = LedgerEntry::new(
            record.id.clone(),
            record.url.clone(),
            record.author_handle.clone(),
            record.author_name.clone(),
            path.display().to_string(),
            record.media_urls.len() as u32,
        );
        self.ledger.record(&entry)?;

        tracing::info!("Saved and recorded: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::SnapshotPage;
    use crate::harvester::pacing::InstantPacer;
    use crate::output::OutputError;
    use crate::storage::SqliteLedger;
    use std::sync::Mutex;

    const HOME: &str = "https://x.com/home";
    const BOOKMARKS: &str = "https://x.com/i/bookmarks";

    /// Keeps written records in memory
    #[derive(Default)]
    struct MemoryWriter {
        written: Mutex<Vec<String>>,
        fail: bool,
    }

    impl DocumentWriter for MemoryWriter {
        fn write(&self, record: &ExtractedRecord) -> OutputResult<PathBuf> {
            if self.fail {
                return Err(OutputError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            self.written.lock().unwrap().push(record.id.clone());
            Ok(PathBuf::from(format!("mem/{}.md", record.id)))
        }
    }

    fn article(id: u32) -> String {
        format!(
            r#"<article data-testid="tweet"><div data-testid="User-Name"><div>User {id}</div><div>@user{id}</div></div><a href="/user{id}/status/{id}"><time datetime="2024-05-14T10:00:00Z">May 14</time></a><div data-testid="tweetText">Post number {id}</div></article>"#,
            id = id
        )
    }

    fn site(ids: &[u32], broken: &[u32]) -> SnapshotPage {
        let list: String = ids.iter().map(|id| article(*id)).collect();
        let mut page = SnapshotPage::new()
            .with_view(HOME, article(999))
            .with_view(BOOKMARKS, list);
        for id in ids {
            let detail = if broken.contains(id) {
                "<main><p>Something went wrong</p></main>".to_string()
            } else {
                article(*id)
            };
            page = page.with_view(format!("https://x.com/user{}/status/{}", id, id), detail);
        }
        page
    }

    fn known(ledger: &mut SqliteLedger, id: u32) {
        ledger
            .record(&LedgerEntry::new(
                id.to_string(),
                format!("https://x.com/user{}/status/{}", id, id),
                format!("@user{}", id),
                format!("User {}", id),
                "old.md",
                0,
            ))
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_saves_new_items() {
        let page = site(&[1, 2, 3], &[]);
        let writer = MemoryWriter::default();
        let pacer = InstantPacer::new();
        let ledger = SqliteLedger::open_in_memory().unwrap();
        let config = Config::default();

        let mut orchestrator = Orchestrator::new(&config, &page, ledger, &writer, &pacer).unwrap();
        let report = orchestrator.run(3).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Success);
        assert_eq!((report.saved, report.skipped, report.failed), (3, 0, 0));
        assert_eq!(report.ledger_total_before, 0);
        assert_eq!(report.ledger_total, 3);
        assert_eq!(orchestrator.state(), PipelineState::DoneSuccess);
        assert_eq!(*writer.written.lock().unwrap(), vec!["1", "2", "3"]);
        // Paced between the three processed items only
        assert_eq!(pacer.count_of(config.pacing.between_items), 2);

        let ledger = orchestrator.into_ledger();
        let entry = &ledger.entries_by_author("@user2").unwrap()[0];
        assert_eq!(entry.file_path, "mem/2.md");
        assert_eq!(entry.author_name, "User 2");
    }

    #[tokio::test]
    async fn test_known_items_are_skipped_without_pacing() {
        let page = site(&[1, 2, 3, 4, 5], &[]);
        let writer = MemoryWriter::default();
        let pacer = InstantPacer::new();
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        known(&mut ledger, 1);
        known(&mut ledger, 4);
        let config = Config::default();

        let mut orchestrator = Orchestrator::new(&config, &page, ledger, &writer, &pacer).unwrap();
        let report = orchestrator.run(5).await.unwrap();

        assert_eq!((report.saved, report.skipped), (3, 2));
        assert_eq!(report.ledger_total_before, 2);
        assert_eq!(report.ledger_total, 5);
        assert_eq!(*writer.written.lock().unwrap(), vec!["2", "3", "5"]);
        assert_eq!(pacer.count_of(config.pacing.between_items), 2);
        assert!(!page.navigations().iter().any(|u| u.ends_with("/status/1")));
    }

    #[tokio::test]
    async fn test_failed_extraction_is_not_recorded() {
        let page = site(&[1, 2], &[1]);
        let writer = MemoryWriter::default();
        let pacer = InstantPacer::new();
        let ledger = SqliteLedger::open_in_memory().unwrap();

        let mut orchestrator =
            Orchestrator::new(&Config::default(), &page, ledger, &writer, &pacer).unwrap();
        let report = orchestrator.run(2).await.unwrap();

        assert_eq!((report.saved, report.skipped, report.failed), (1, 0, 1));
        assert!(!orchestrator.ledger().exists("1").unwrap());
        assert!(orchestrator.ledger().exists("2").unwrap());
    }

    #[tokio::test]
    async fn test_auth_failure_stops_before_collection() {
        let page = SnapshotPage::new()
            .with_view(HOME, "<main><a href=\"/i/flow/login\">Sign in</a></main>")
            .with_view(BOOKMARKS, article(1));
        let writer = MemoryWriter::default();
        let pacer = InstantPacer::new();
        let ledger = SqliteLedger::open_in_memory().unwrap();

        let mut orchestrator =
            Orchestrator::new(&Config::default(), &page, ledger, &writer, &pacer).unwrap();
        let report = orchestrator.run(5).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::AuthFailed);
        assert_eq!(orchestrator.state(), PipelineState::DoneAuthFailed);
        assert_eq!(page.navigations(), vec![HOME.to_string()]);
    }

    #[tokio::test]
    async fn test_home_navigation_failure_is_auth_failure() {
        let page = SnapshotPage::new();
        let writer = MemoryWriter::default();
        let pacer = InstantPacer::new();
        let ledger = SqliteLedger::open_in_memory().unwrap();

        let mut orchestrator =
            Orchestrator::new(&Config::default(), &page, ledger, &writer, &pacer).unwrap();
        let report = orchestrator.run(5).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::AuthFailed);
    }

    #[tokio::test]
    async fn test_empty_bookmarks_is_collection_error() {
        let page = SnapshotPage::new()
            .with_view(HOME, article(999))
            .with_view(BOOKMARKS, "<main><p>Save posts for later</p></main>");
        let writer = MemoryWriter::default();
        let pacer = InstantPacer::new();
        let ledger = SqliteLedger::open_in_memory().unwrap();

        let mut orchestrator =
            Orchestrator::new(&Config::default(), &page, ledger, &writer, &pacer).unwrap();
        let result = orchestrator.run(5).await;

        assert!(matches!(result, Err(HarvestError::Collection(_))));
        assert_eq!(orchestrator.state(), PipelineState::DoneAuthFailed);
    }

    #[tokio::test]
    async fn test_no_readable_items_is_no_items() {
        let page = SnapshotPage::new()
            .with_view(HOME, article(999))
            .with_view(
                BOOKMARKS,
                r#"<main><article data-testid="tweet"><p>Promoted</p></article></main>"#,
            );
        let writer = MemoryWriter::default();
        let pacer = InstantPacer::new();
        let ledger = SqliteLedger::open_in_memory().unwrap();

        let mut orchestrator =
            Orchestrator::new(&Config::default(), &page, ledger, &writer, &pacer).unwrap();
        let report = orchestrator.run(5).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::NoItems);
        assert_eq!(orchestrator.state(), PipelineState::DoneNoItems);
    }

    #[tokio::test]
    async fn test_writer_failure_propagates() {
        let page = site(&[1], &[]);
        let writer = MemoryWriter {
            fail: true,
            ..Default::default()
        };
        let pacer = InstantPacer::new();
        let ledger = SqliteLedger::open_in_memory().unwrap();

        let mut orchestrator =
            Orchestrator::new(&Config::default(), &page, ledger, &writer, &pacer).unwrap();
        let result = orchestrator.run(1).await;

        assert!(matches!(result, Err(HarvestError::Output(_))));
        assert!(!orchestrator.ledger().exists("1").unwrap());
    }
}
