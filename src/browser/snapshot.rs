//! Page driver over saved HTML snapshots
//!
//! Each URL maps to one or more frames of HTML. Navigation loads the first
//! frame; every forward scroll reveals the next frame (staying on the last one
//! once the list is exhausted), which mimics an infinitely scrolling list that
//! renders more items as it moves. Elements are addressed by their position in
//! document order within the frame they were found in.

use crate::browser::{BrowserError, BrowserResult, PageDriver};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Elements that start a new visual line when rendered
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "dt", "dd", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "ul",
];

/// Handle to an element inside one snapshot frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNode {
    view: String,
    frame: usize,
    ordinal: usize,
}

#[derive(Debug, Default)]
struct SnapshotState {
    views: HashMap<String, Vec<String>>,
    current: Option<String>,
    frame: usize,
    navigations: Vec<String>,
    scrolls: usize,
}

/// An in-memory [`PageDriver`] replaying saved HTML
#[derive(Debug, Default)]
pub struct SnapshotPage {
    state: Mutex<SnapshotState>,
}

impl SnapshotPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single-frame view for `url`
    pub fn with_view(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.with_frames(url, vec![html.into()])
    }

    /// Registers a scrolling view for `url`; frame `n` is shown after `n` scrolls
    pub fn with_frames(self, url: impl Into<String>, frames: Vec<String>) -> Self {
        self.lock().views.insert(url.into(), frames);
        self
    }

    /// Every URL successfully navigated to, in order
    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// Number of scroll requests received
    pub fn scroll_count(&self) -> usize {
        self.lock().scrolls
    }

    fn lock(&self) -> MutexGuard<'_, SnapshotState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// HTML of the frame currently on screen, with its address
    fn current_frame(&self) -> Option<(String, usize, String)> {
        let state = self.lock();
        let view = state.current.clone()?;
        let html = state.views.get(&view)?.get(state.frame)?.clone();
        Some((view, state.frame, html))
    }

    /// HTML of the frame a node was found in
    fn frame_of(&self, node: &SnapshotNode) -> BrowserResult<String> {
        self.lock()
            .views
            .get(&node.view)
            .and_then(|frames| frames.get(node.frame))
            .cloned()
            .ok_or(BrowserError::StaleElement)
    }

    fn select_in(
        &self,
        scope: Option<&SnapshotNode>,
        selector: &str,
    ) -> BrowserResult<Vec<SnapshotNode>> {
        let selector = parse_selector(selector)?;

        let (view, frame, html) = match scope {
            Some(node) => (node.view.clone(), node.frame, self.frame_of(node)?),
            None => match self.current_frame() {
                Some(current) => current,
                None => return Ok(Vec::new()),
            },
        };

        let document = Html::parse_document(&html);
        let all = elements(&document);
        let scope_el = match scope {
            Some(node) => Some(*all.get(node.ordinal).ok_or(BrowserError::StaleElement)?),
            None => None,
        };

        Ok(all
            .iter()
            .enumerate()
            .filter(|(_, el)| match scope_el {
                Some(scope_el) => el.ancestors().any(|a| a.id() == scope_el.id()),
                None => true,
            })
            .filter(|(_, el)| selector.matches(el))
            .map(|(ordinal, _)| SnapshotNode {
                view: view.clone(),
                frame,
                ordinal,
            })
            .collect())
    }

    /// Runs `read` against the element a node points at
    fn read_node<T>(
        &self,
        node: &SnapshotNode,
        read: impl FnOnce(ElementRef<'_>) -> BrowserResult<T>,
    ) -> BrowserResult<T> {
        let html = self.frame_of(node)?;
        let document = Html::parse_document(&html);
        let element = elements(&document)
            .get(node.ordinal)
            .copied()
            .ok_or(BrowserError::StaleElement)?;
        read(element)
    }
}

fn parse_selector(selector: &str) -> BrowserResult<Selector> {
    Selector::parse(selector).map_err(|_| BrowserError::Selector(selector.to_string()))
}

/// All elements of a document in document order
fn elements(document: &Html) -> Vec<ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect()
}

/// Concatenates the text nodes under `element`, turning `<br>` into `\n`
pub(crate) fn text_with_breaks(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Approximates `innerText`: block elements and `<br>` break lines, blank
/// lines are dropped and each line is trimmed
pub(crate) fn rendered_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_rendered(element, &mut raw);
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_rendered(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(el) => {
                let block = BLOCK_ELEMENTS.contains(&el.name());
                if let Some(child_el) = ElementRef::wrap(child) {
                    if block {
                        out.push('\n');
                    }
                    push_rendered(child_el, out);
                    if block {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl PageDriver for SnapshotPage {
    type Node = SnapshotNode;

    async fn navigate(&self, url: &str, _timeout: Duration) -> BrowserResult<()> {
        let mut state = self.lock();
        if !state.views.contains_key(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "no snapshot recorded for this URL".to_string(),
            });
        }
        state.current = Some(url.to_string());
        state.frame = 0;
        state.navigations.push(url.to_string());
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> BrowserResult<bool> {
        Ok(!self.select_in(None, selector)?.is_empty())
    }

    async fn query_all(&self, selector: &str) -> BrowserResult<Vec<SnapshotNode>> {
        self.select_in(None, selector)
    }

    async fn query_in(
        &self,
        scope: &SnapshotNode,
        selector: &str,
    ) -> BrowserResult<Option<SnapshotNode>> {
        Ok(self.select_in(Some(scope), selector)?.into_iter().next())
    }

    async fn query_all_in(
        &self,
        scope: &SnapshotNode,
        selector: &str,
    ) -> BrowserResult<Vec<SnapshotNode>> {
        self.select_in(Some(scope), selector)
    }

    async fn attribute(&self, node: &SnapshotNode, name: &str) -> BrowserResult<Option<String>> {
        self.read_node(node, |el| Ok(el.value().attr(name).map(str::to_string)))
    }

    async fn closest_attribute(
        &self,
        node: &SnapshotNode,
        selector: &str,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        let selector = parse_selector(selector)?;
        self.read_node(node, |el| {
            Ok(std::iter::once(el)
                .chain(el.ancestors().filter_map(ElementRef::wrap))
                .find(|candidate| selector.matches(candidate))
                .and_then(|found| found.value().attr(name).map(str::to_string)))
        })
    }

    async fn inner_text(&self, node: &SnapshotNode) -> BrowserResult<String> {
        self.read_node(node, |el| Ok(rendered_text(el)))
    }

    async fn text_with_breaks(&self, node: &SnapshotNode) -> BrowserResult<String> {
        self.read_node(node, |el| Ok(text_with_breaks(el)))
    }

    async fn scroll_by(&self, dy: i64) -> BrowserResult<()> {
        let mut state = self.lock();
        state.scrolls += 1;
        if dy > 0 {
            let last = state
                .current
                .as_ref()
                .and_then(|view| state.views.get(view))
                .map(|frames| frames.len().saturating_sub(1))
                .unwrap_or(0);
            state.frame = (state.frame + 1).min(last);
        }
        Ok(())
    }

    async fn current_url(&self) -> BrowserResult<Option<String>> {
        Ok(self.lock().current.clone())
    }
}
