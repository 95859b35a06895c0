//! Live browser driver over the Chrome DevTools Protocol
//!
//! Launches Chrome/Chromium through chromiumoxide, keeps its event handler
//! running on a background task, and exposes tabs as [`ChromePage`] drivers.

use crate::browser::{BrowserError, BrowserResult, PageDriver};
use crate::config::BrowserConfig;
use crate::session::StoredCookie;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Interval between element polls while waiting for a selector
const POLL_INTERVAL: Duration = Duration::from_millis(250);

const TEXT_WITH_BREAKS_JS: &str = r#"function() {
    const parts = [];
    const walker = document.createTreeWalker(this, NodeFilter.SHOW_TEXT | NodeFilter.SHOW_ELEMENT);
    let node;
    while ((node = walker.nextNode())) {
        if (node.nodeType === Node.TEXT_NODE) {
            parts.push(node.textContent || '');
        } else if (node.nodeName === 'BR') {
            parts.push('\n');
        }
    }
    return parts.join('');
}"#;

impl From<CdpError> for BrowserError {
    fn from(err: CdpError) -> Self {
        BrowserError::Protocol(err.to_string())
    }
}

/// How to launch the browser
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub user_agent: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub executable: Option<String>,
    /// Hide the `navigator.webdriver` automation flag (used for interactive login)
    pub disable_automation_flag: bool,
}

impl LaunchOptions {
    /// Options for an unattended scraping run
    pub fn for_scraping(config: &BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            user_agent: None,
            window_width: config.window_width,
            window_height: config.window_height,
            executable: config.executable.clone(),
            disable_automation_flag: false,
        }
    }

    /// Options for the interactive login window
    pub fn for_login(config: &BrowserConfig) -> Self {
        Self {
            headless: false,
            user_agent: Some(config.user_agent.clone()),
            window_width: config.window_width,
            window_height: config.window_height,
            executable: config.executable.clone(),
            disable_automation_flag: true,
        }
    }
}

/// A running browser plus the task pumping its CDP events
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Launches a browser with the given options
pub async fn launch(options: &LaunchOptions) -> BrowserResult<BrowserSession> {
    let mut builder = CdpBrowserConfig::builder()
        .window_size(options.window_width, options.window_height)
        .viewport(None);

    if !options.headless {
        builder = builder.with_head();
    }
    if let Some(user_agent) = &options.user_agent {
        builder = builder.arg(format!("--user-agent={}", user_agent));
    }
    if options.disable_automation_flag {
        builder = builder.arg("--disable-blink-features=AutomationControlled");
    }
    if let Some(executable) = &options.executable {
        builder = builder.chrome_executable(executable);
    }

    let config = builder.build().map_err(BrowserError::Launch)?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| BrowserError::Launch(e.to_string()))?;

    let handler = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!("Browser event handler stopped: {}", e);
                break;
            }
        }
    });

    tracing::debug!(headless = options.headless, "Browser launched");

    Ok(BrowserSession { browser, handler })
}

impl BrowserSession {
    /// Opens a new blank tab
    pub async fn new_page(&self) -> BrowserResult<ChromePage> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(ChromePage { page })
    }

    /// Closes the browser and stops the event handler
    pub async fn close(mut self) -> BrowserResult<()> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        closed?;
        Ok(())
    }
}

/// One Chrome tab driven as a [`PageDriver`]
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    /// Reads every cookie visible to the current page
    pub async fn export_cookies(&self) -> BrowserResult<Vec<StoredCookie>> {
        let cookies = self.page.get_cookies().await?;
        Ok(cookies
            .into_iter()
            .map(|c| StoredCookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                secure: c.secure,
                http_only: c.http_only,
                expires: if c.session { None } else { Some(c.expires) },
            })
            .collect())
    }

    /// Installs previously saved cookies into the browser
    pub async fn import_cookies(&self, cookies: &[StoredCookie]) -> BrowserResult<()> {
        let mut params = Vec::with_capacity(cookies.len());
        for cookie in cookies {
            let mut builder = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .secure(cookie.secure)
                .http_only(cookie.http_only);
            if let Some(expires) = cookie.expires.filter(|e| *e > 0.0) {
                builder = builder.expires(TimeSinceEpoch::new(expires));
            }
            params.push(builder.build().map_err(BrowserError::Protocol)?);
        }

        if !params.is_empty() {
            self.page.set_cookies(params).await?;
        }
        Ok(())
    }

    async fn call_string_fn(&self, node: &Element, function: String) -> BrowserResult<Option<String>> {
        let returns = node.call_js_fn(function, false).await?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_str().map(str::to_string)))
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    type Node = Element;

    async fn navigate(&self, url: &str, timeout: Duration) -> BrowserResult<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(BrowserError::Timeout {
                action: format!("loading {}", url),
                timeout,
            }),
        }
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> BrowserResult<bool> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, self.page.find_elements(selector)).await {
                Ok(Ok(found)) if !found.is_empty() => return Ok(true),
                Ok(Ok(_)) => {}
                // The document may be mid-navigation; keep polling until the deadline
                Ok(Err(e)) => tracing::trace!("Polling '{}' failed: {}", selector, e),
                Err(_) => return Ok(false),
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn query_all(&self, selector: &str) -> BrowserResult<Vec<Element>> {
        Ok(self.page.find_elements(selector).await?)
    }

    async fn query_in(&self, scope: &Element, selector: &str) -> BrowserResult<Option<Element>> {
        Ok(scope.find_elements(selector).await?.into_iter().next())
    }

    async fn query_all_in(&self, scope: &Element, selector: &str) -> BrowserResult<Vec<Element>> {
        Ok(scope.find_elements(selector).await?)
    }

    async fn attribute(&self, node: &Element, name: &str) -> BrowserResult<Option<String>> {
        Ok(node.attribute(name).await?)
    }

    async fn closest_attribute(
        &self,
        node: &Element,
        selector: &str,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        let function = format!(
            "function() {{ const el = this.closest({}); return el ? el.getAttribute({}) : null; }}",
            serde_json::Value::from(selector),
            serde_json::Value::from(name)
        );
        self.call_string_fn(node, function).await
    }

    async fn inner_text(&self, node: &Element) -> BrowserResult<String> {
        Ok(node.inner_text().await?.unwrap_or_default())
    }

    async fn text_with_breaks(&self, node: &Element) -> BrowserResult<String> {
        Ok(self
            .call_string_fn(node, TEXT_WITH_BREAKS_JS.to_string())
            .await?
            .unwrap_or_default())
    }

    async fn scroll_by(&self, dy: i64) -> BrowserResult<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {})", dy))
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> BrowserResult<Option<String>> {
        Ok(self.page.url().await?)
    }
}
