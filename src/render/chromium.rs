/// Headless Chromium renderer built on chromiumoxide.
///
/// One call = one isolated browser process: launch, navigate, wait for the
/// station table to appear, settle, grab the DOM, tear down. No cookies,
/// cache, or navigation state survives between calls. chromiumoxide is an
/// async API, so each call spins up a private current-thread tokio runtime
/// and blocks on it; the surrounding service stays thread-based.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use chrono::Utc;
use futures::StreamExt;
use std::time::Duration;

use super::{PageRenderer, RenderError, RenderedPage};

/// How often to re-check for the readiness selector while the page script
/// is still populating the table.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Renders pages with a fresh headless Chromium session per call.
pub struct ChromiumRenderer {
    /// Selector whose presence signals the data container has rendered.
    ready_selector: String,
    /// Additional wait after readiness, for rows that trickle in late.
    settle: Duration,
}

impl ChromiumRenderer {
    pub fn new(ready_selector: impl Into<String>, settle: Duration) -> Self {
        Self {
            ready_selector: ready_selector.into(),
            settle,
        }
    }

    /// Launches a browser, renders `url`, and returns the final DOM.
    ///
    /// Runs entirely inside the caller's deadline; when the enclosing
    /// timeout cancels this future, dropping the `Browser` reaps the
    /// Chromium child process.
    async fn render_session(&self, url: &str) -> Result<String, RenderError> {
        let config = BrowserConfig::builder()
            .args(vec!["--no-sandbox", "--disable-setuid-sandbox"])
            .build()
            .map_err(RenderError::EngineCrash)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::EngineCrash(e.to_string()))?;

        // The handler stream must be polled for the browser to make
        // progress; it ends when the browser connection closes.
        let events = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let outcome = self.fetch_document(&browser, url).await;

        let _ = browser.close().await;
        events.abort();

        outcome
    }

    async fn fetch_document(&self, browser: &Browser, url: &str) -> Result<String, RenderError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::EngineCrash(e.to_string()))?;

        page.goto(url)
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        self.wait_for_ready(&page).await;

        // The table element exists before the page script finishes filling
        // rows in, so give it a bounded settle window.
        tokio::time::sleep(self.settle).await;

        let html = page
            .content()
            .await
            .map_err(|e| RenderError::EngineCrash(e.to_string()))?;

        let _ = page.close().await;

        Ok(html)
    }

    /// Polls until the readiness selector matches. Unbounded by itself; the
    /// caller's wall-clock deadline cancels it at the next await point.
    async fn wait_for_ready(&self, page: &Page) {
        loop {
            if page.find_element(self.ready_selector.as_str()).await.is_ok() {
                return;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

impl PageRenderer for ChromiumRenderer {
    fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, RenderError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RenderError::EngineCrash(e.to_string()))?;

        let outcome = runtime.block_on(async {
            match tokio::time::timeout(timeout, self.render_session(url)).await {
                Ok(result) => result,
                Err(_) => Err(RenderError::Timeout {
                    url: url.to_string(),
                    budget: timeout,
                }),
            }
        });

        outcome.map(|html| RenderedPage {
            html,
            fetched_at: Utc::now(),
        })
    }
}
