use crate::browser::{launch, BrowserSession, ChromePage, LaunchOptions, PageDriver};
use crate::config::Config;
use crate::session::store::{load_cookies, save_cookies};
use crate::{HarvestError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Interval between URL checks while the user completes the login flow
const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polls the page URL until it ends with `suffix`
///
/// There is no deadline: the user may take as long as they need to sign in.
pub async fn wait_for_url_suffix<P: PageDriver>(
    page: &P,
    suffix: &str,
    interval: Duration,
) -> Result<String> {
    loop {
        if let Some(url) = page.current_url().await? {
            let path = url.split(['?', '#']).next().unwrap_or(&url);
            if path.trim_end_matches('/').ends_with(suffix) {
                return Ok(url);
            }
        }
        tokio::time::sleep(interval).await;
    }
}

/// Opens a headed browser on the login page and saves the session once the
/// user lands on the home view
///
/// # Returns
///
/// The number of cookies written to the session file
pub async fn login_interactive(config: &Config) -> Result<usize> {
    let session = launch(&LaunchOptions::for_login(&config.browser)).await?;
    let page = session.new_page().await?;

    let login_url = config.site.login_url();
    page.navigate(&login_url, Duration::from_millis(config.timeouts.navigation_ms))
        .await?;

    println!("Please log in in the browser window.");
    println!("Waiting for the home timeline to load...");

    let landed = wait_for_url_suffix(&page, &config.site.home_path, LOGIN_POLL_INTERVAL).await?;
    tracing::info!("Login detected at {}", landed);

    let cookies = page.export_cookies().await?;
    if cookies.is_empty() {
        session.close().await?;
        return Err(HarvestError::Session(
            "the browser reported no cookies after login".to_string(),
        ));
    }
    let path = PathBuf::from(&config.browser.session_path);
    save_cookies(&path, &cookies)?;
    tracing::info!("Saved {} cookies to {}", cookies.len(), path.display());

    session.close().await?;
    Ok(cookies.len())
}

/// A scraping browser with the saved session restored into it
pub struct AuthenticatedSession {
    session: BrowserSession,
    page: ChromePage,
    session_path: PathBuf,
    restored: bool,
}

impl AuthenticatedSession {
    /// Launches the scraping browser and restores the session file if present
    ///
    /// A missing session file is not an error here; session verification
    /// reports the problem once the home view fails to load.
    pub async fn open(config: &Config) -> Result<Self> {
        let session = launch(&LaunchOptions::for_scraping(&config.browser)).await?;
        let page = session.new_page().await?;
        let session_path = PathBuf::from(&config.browser.session_path);

        let restored = if session_path.exists() {
            let cookies = load_cookies(&session_path).map_err(|e| {
                HarvestError::Session(format!(
                    "cannot restore {}: {}",
                    session_path.display(),
                    e
                ))
            })?;
            page.import_cookies(&cookies).await?;
            tracing::debug!(
                "Restored {} cookies from {}",
                cookies.len(),
                session_path.display()
            );
            true
        } else {
            tracing::warn!("No session file at {}", session_path.display());
            false
        };

        Ok(Self {
            session,
            page,
            session_path,
            restored,
        })
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    /// Saves refreshed cookies (when a session was restored) and closes the browser
    pub async fn close(self) -> Result<()> {
        if self.restored {
            match self.page.export_cookies().await {
                Ok(cookies) => save_cookies(&self.session_path, &cookies)?,
                Err(e) => tracing::warn!("Could not refresh session cookies: {}", e),
            }
        }
        self.session.close().await?;
        Ok(())
    }
}
