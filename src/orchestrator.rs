/// Scrape orchestration with retry and cached fallback.
///
/// ## Flow
///
/// 1. Render the source page through the configured renderer.
/// 2. Extract station readings from the rendered document.
/// 3. On success, persist the snapshot as the new last-known-good copy
///    (skipped when the readings are unchanged since the previous scrape).
/// 4. On failure, retry with a fixed backoff up to the attempt budget.
/// 5. When the budget is spent, fall back to the stored snapshot, re-tagged
///    as cached so callers can tell stale data from live data.
///
/// Persistence failures never fail a live scrape: fresh data is always
/// worth more than a durable copy of it, so a write error is logged and
/// the snapshot is returned anyway.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::extract::{self, Confidence};
use crate::model::{ScrapeError, Snapshot, Source};
use crate::render::PageRenderer;
use crate::store::{SnapshotStore, WATER_LEVEL_KEY};

pub struct ScrapeOrchestrator {
    renderer: Arc<dyn PageRenderer>,
    store: Arc<dyn SnapshotStore>,
    source_url: String,
    render_timeout: Duration,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl ScrapeOrchestrator {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        store: Arc<dyn SnapshotStore>,
        source_url: impl Into<String>,
        render_timeout: Duration,
        retry_attempts: u32,
        retry_backoff: Duration,
    ) -> Self {
        assert!(retry_attempts >= 1, "at least one scrape attempt is required");
        Self {
            renderer,
            store,
            source_url: source_url.into(),
            render_timeout,
            retry_attempts,
            retry_backoff,
        }
    }

    pub fn from_config(
        renderer: Arc<dyn PageRenderer>,
        store: Arc<dyn SnapshotStore>,
        config: &ServiceConfig,
    ) -> Self {
        Self::new(
            renderer,
            store,
            config.source_url.clone(),
            config.render_timeout(),
            config.retry_attempts,
            config.retry_backoff(),
        )
    }

    /// Produces the freshest snapshot obtainable right now.
    ///
    /// The boolean is true when the snapshot came from the store rather
    /// than a live scrape. Returns `NoDataAvailable` only when every
    /// attempt failed and the store holds nothing.
    pub fn get_latest(&self) -> Result<(Snapshot, bool), ScrapeError> {
        match self.scrape_live() {
            Ok(snapshot) => {
                self.persist(&snapshot);
                Ok((snapshot, false))
            }
            Err(last_err) => {
                eprintln!(
                    "✗ Live scrape failed after {} attempts: {}",
                    self.retry_attempts, last_err
                );
                match self.store.get(WATER_LEVEL_KEY) {
                    Ok(Some(mut cached)) => {
                        println!(
                            "✓ Serving cached snapshot from {} ({} stations)",
                            cached.fetched_at,
                            cached.readings.len()
                        );
                        cached.source = Source::Cached;
                        Ok((cached, true))
                    }
                    Ok(None) => Err(ScrapeError::NoDataAvailable),
                    Err(e) => {
                        eprintln!("✗ Snapshot store read failed: {}", e);
                        Err(ScrapeError::NoDataAvailable)
                    }
                }
            }
        }
    }

    /// One full render+extract cycle per attempt, up to the retry budget.
    fn scrape_live(&self) -> Result<Snapshot, ScrapeError> {
        let mut last_err = ScrapeError::NoDataAvailable;

        for attempt in 1..=self.retry_attempts {
            if attempt > 1 {
                thread::sleep(self.retry_backoff);
            }

            match self.attempt_once() {
                Ok(snapshot) => {
                    println!(
                        "✓ Scrape attempt {}/{} succeeded: {} stations",
                        attempt,
                        self.retry_attempts,
                        snapshot.readings.len()
                    );
                    return Ok(snapshot);
                }
                Err(e) => {
                    eprintln!(
                        "✗ Scrape attempt {}/{} failed: {}",
                        attempt, self.retry_attempts, e
                    );
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    fn attempt_once(&self) -> Result<Snapshot, ScrapeError> {
        let page = self
            .renderer
            .render(&self.source_url, self.render_timeout)?;

        let extraction = extract::extract(&page.html, page.fetched_at);

        if extraction.confidence == Confidence::TableMissing {
            return Err(ScrapeError::LowConfidenceExtraction(
                "station table not found in rendered document".to_string(),
            ));
        }
        if extraction.readings.is_empty() {
            // The container rendered but held no rows; treat it like a page
            // that had not finished loading and let the retry loop re-render.
            return Err(ScrapeError::LowConfidenceExtraction(
                "station table present but contained no station rows".to_string(),
            ));
        }
        if extraction.skipped_rows > 0 {
            println!(
                "   Skipped {} malformed rows out of {}",
                extraction.skipped_rows,
                extraction.skipped_rows + extraction.readings.len()
            );
        }

        Ok(Snapshot {
            readings: extraction.readings,
            fetched_at: page.fetched_at,
            source: Source::Live,
        })
    }

    /// Best-effort write of a live snapshot. Unchanged readings are not
    /// rewritten, so a quiet river does not churn the store every poll.
    fn persist(&self, snapshot: &Snapshot) {
        match self.store.get(WATER_LEVEL_KEY) {
            Ok(Some(previous)) if previous.readings == snapshot.readings => {
                println!("   Station data unchanged since last scrape, skipping write");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                // Can't compare against a previous copy; write anyway.
                eprintln!("✗ Snapshot store read failed before write: {}", e);
            }
        }

        if let Err(e) = self.store.put(WATER_LEVEL_KEY, snapshot) {
            eprintln!("✗ Snapshot store write failed (serving live data anyway): {}", e);
        }
    }
}
