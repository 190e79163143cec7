/// Headless page rendering for the JavaScript-populated source page.
///
/// The PAGASA table arrives empty over plain HTTP and is filled in by the
/// page's own script, so a real rendering engine has to run before there is
/// anything to parse. This module defines the rendering contract plus two
/// implementations:
///
/// - `chromium::ChromiumRenderer` — one isolated headless Chromium session
///   per call, driven through chromiumoxide.
/// - `pool::RenderPool` — a bounded slot pool wrapped around any renderer,
///   so concurrent callers queue instead of spawning unbounded sessions.

pub mod chromium;
pub mod pool;

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::model::ScrapeError;

// ---------------------------------------------------------------------------
// Render result
// ---------------------------------------------------------------------------

/// One successfully rendered document. Request-local: it is handed to the
/// extractor and dropped, never cached or shared across requests.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Rendering failures. All variants are retryable from the caller's side;
/// none are fatal to the process.
#[derive(Debug, PartialEq)]
pub enum RenderError {
    /// The readiness condition was not met within the wall-clock deadline.
    Timeout { url: String, budget: Duration },
    /// DNS/connection failure or the target page rejected navigation.
    Navigation(String),
    /// The browser process could not start or died mid-render.
    EngineCrash(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Timeout { url, budget } => {
                write!(f, "page {} not ready within {:?}", url, budget)
            }
            RenderError::Navigation(msg) => write!(f, "navigation failed: {}", msg),
            RenderError::EngineCrash(msg) => write!(f, "rendering engine failure: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<RenderError> for ScrapeError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Timeout { .. } => ScrapeError::RenderTimeout(err.to_string()),
            RenderError::Navigation(msg) => ScrapeError::Navigation(msg),
            RenderError::EngineCrash(msg) => ScrapeError::EngineCrash(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering contract
// ---------------------------------------------------------------------------

/// A component that can turn a URL into a rendered document.
///
/// Implementations must guarantee that `render` returns within roughly
/// `timeout` on every path (success, failure, engine death) — a caller is
/// allowed to hold a request thread on this call and must never hang.
/// Implementations share no mutable session state across calls.
pub trait PageRenderer: Send + Sync {
    fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, RenderError>;
}
