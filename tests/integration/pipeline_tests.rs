//! End-to-end tests for the harvesting pipeline
//!
//! These tests replay saved HTML through `SnapshotPage`, write real markdown
//! files and a real SQLite ledger into a temporary directory, and never sleep.

use bookmark_harvester::browser::SnapshotPage;
use bookmark_harvester::config::Config;
use bookmark_harvester::harvester::{InstantPacer, Orchestrator};
use bookmark_harvester::output::MarkdownWriter;
use bookmark_harvester::storage::{Ledger, SqliteLedger};
use bookmark_harvester::{HarvestError, PipelineState, RunOutcome, RunReport};
use std::path::{Path, PathBuf};

const HOME: &str = "https://x.com/home";
const BOOKMARKS: &str = "https://x.com/i/bookmarks";

fn item_url(id: u64) -> String {
    format!("https://x.com/author{}/status/{}", id % 3, id)
}

fn article(id: u64) -> String {
    format!(
        r#"<article data-testid="tweet">
<div data-testid="User-Name"><div><span>Author {a}</span></div><div><span>@author{a}</span></div><div><span>·</span></div></div>
<a href="/author{a}/status/{id}"><time datetime="2024-03-0{d}T08:15:00.000Z">Mar {d}</time></a>
<div data-testid="tweetText"><span>Bookmark {id} #rust</span><br><span>second line</span></div>
</article>"#,
        a = id % 3,
        id = id,
        d = id % 9 + 1
    )
}

fn list_frame(ids: &[u64]) -> String {
    let items: String = ids.iter().map(|id| article(*id)).collect();
    format!("<html><body><main><section>{}</section></main></body></html>", items)
}

/// A logged-in site whose bookmarks list reveals `frames` as it scrolls
fn site(frames: &[&[u64]]) -> SnapshotPage {
    let mut page = SnapshotPage::new()
        .with_view(HOME, list_frame(&[1000]))
        .with_frames(BOOKMARKS, frames.iter().map(|ids| list_frame(ids)).collect());

    let mut all: Vec<u64> = frames.iter().flat_map(|ids| ids.iter().copied()).collect();
    all.sort_unstable();
    all.dedup();
    for id in all {
        page = page.with_view(item_url(id), list_frame(&[id]));
    }
    page
}

struct Workspace {
    dir: tempfile::TempDir,
    config: Config,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.output.database_path = dir.path().join("pipeline.db").display().to_string();
        config.output.output_dir = dir.path().join("output").display().to_string();
        Self { dir, config }
    }

    fn ledger(&self) -> SqliteLedger {
        SqliteLedger::open(Path::new(&self.config.output.database_path)).unwrap()
    }

    fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    fn documents(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.output_dir()) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    async fn run(&self, page: &SnapshotPage, max_items: usize) -> Result<RunReport, HarvestError> {
        let writer = MarkdownWriter::new(self.output_dir());
        let pacer = InstantPacer::new();

        let mut orchestrator = Orchestrator::new(&self.config, page, self.ledger(), &writer, &pacer)?;
        let result = orchestrator.run(max_items).await;
        orchestrator.into_ledger().close()?;
        result
    }
}

#[tokio::test]
async fn test_quota_with_all_new_items() {
    let workspace = Workspace::new();
    let page = site(&[&[11, 12, 13, 14]]);

    let report = workspace.run(&page, 3).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Success);
    assert_eq!((report.saved, report.skipped, report.failed), (3, 0, 0));
    assert_eq!(report.ledger_total_before, 0);
    assert_eq!(report.ledger_total, 3);
    assert_eq!(
        workspace.documents(),
        vec!["_author0-12.md", "_author1-13.md", "_author2-11.md"]
    );
}

#[tokio::test]
async fn test_quota_with_known_items() {
    let workspace = Workspace::new();

    let first = site(&[&[21, 22]]);
    let seeded = workspace.run(&first, 2).await.unwrap();
    assert_eq!(seeded.saved, 2);

    let page = site(&[&[20, 21, 22, 23, 24]]);
    let report = workspace.run(&page, 5).await.unwrap();

    assert_eq!((report.saved, report.skipped), (3, 2));
    assert_eq!(report.ledger_total_before, 2);
    assert_eq!(report.ledger_total, 5);

    let visited: Vec<String> = page.navigations();
    assert!(!visited.contains(&item_url(21)));
    assert!(!visited.contains(&item_url(22)));
    assert!(visited.contains(&item_url(24)));
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let workspace = Workspace::new();

    let first = workspace.run(&site(&[&[1, 2], &[2, 3]]), 3).await.unwrap();
    assert_eq!(first.saved, 3);
    let documents = workspace.documents();
    let recent_before = workspace.ledger().recent(10).unwrap();

    let page = site(&[&[1, 2], &[2, 3]]);
    let second = workspace.run(&page, 3).await.unwrap();

    assert_eq!((second.saved, second.skipped), (0, 3));
    assert_eq!(second.ledger_total_before, second.ledger_total);
    assert_eq!(workspace.documents(), documents);
    assert_eq!(workspace.ledger().recent(10).unwrap(), recent_before);
    // Only the home and bookmarks views were visited
    assert_eq!(page.navigations(), vec![HOME.to_string(), BOOKMARKS.to_string()]);
}

#[tokio::test]
async fn test_rerendered_items_are_collected_once() {
    let workspace = Workspace::new();
    let page = site(&[&[1, 2, 3], &[2, 3, 4], &[3, 4, 5]]);

    let report = workspace.run(&page, 5).await.unwrap();

    assert_eq!(report.saved, 5);
    assert_eq!(workspace.ledger().count().unwrap(), 5);
    assert_eq!(page.scroll_count(), 2);
}

#[tokio::test]
async fn test_short_list_saves_what_exists() {
    let workspace = Workspace::new();
    let page = site(&[&[7, 8]]);

    let report = workspace.run(&page, 10).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Success);
    assert_eq!(report.saved, 2);
}

#[tokio::test]
async fn test_saved_document_contents() {
    let workspace = Workspace::new();
    let page = site(&[&[4]]);

    workspace.run(&page, 1).await.unwrap();

    let content = std::fs::read_to_string(workspace.output_dir().join("_author1-4.md")).unwrap();
    assert!(content.contains("title: Author 1 on X: \"Bookmark 4 #rust second line...\"\n"));
    assert!(content.contains("source: https://x.com/author1/status/4\n"));
    assert!(content.contains("author:\n  - \"@author1\"\n"));
    assert!(content.contains("published: 2024-03-05\n"));
    assert!(content.contains("tags:\n  - rust\n"));
    assert!(content.contains("---\nBookmark 4 #rust\nsecond line\n"));

    let entry = &workspace.ledger().entries_by_author("@author1").unwrap()[0];
    assert_eq!(entry.id, "4");
    assert!(entry.file_path.ends_with("_author1-4.md"));
    assert!(!entry.has_media);
}

#[tokio::test]
async fn test_unauthenticated_session() {
    let workspace = Workspace::new();
    let page = SnapshotPage::new()
        .with_view(HOME, "<html><body><h1>Sign in to X</h1></body></html>")
        .with_view(BOOKMARKS, list_frame(&[1]));

    let report = workspace.run(&page, 5).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::AuthFailed);
    assert_eq!(report.outcome.terminal_state(), PipelineState::DoneAuthFailed);
    assert!(workspace.documents().is_empty());
}

#[tokio::test]
async fn test_empty_bookmarks_list_fails_collection() {
    let workspace = Workspace::new();
    let page = SnapshotPage::new()
        .with_view(HOME, list_frame(&[1000]))
        .with_view(BOOKMARKS, "<html><body><main></main></body></html>");

    let result = workspace.run(&page, 5).await;

    assert!(matches!(result, Err(HarvestError::Collection(_))));
    assert_eq!(workspace.ledger().count().unwrap(), 0);
}
