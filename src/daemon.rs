/// Background polling loop
///
/// Keeps the cached snapshot warm so the first API request after an
/// upstream outage is served from recent data instead of waiting on a
/// fresh render. The loop is optional; with polling disabled the service
/// only scrapes on demand.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;

use crate::orchestrator::ScrapeOrchestrator;

/// Maximum consecutive-failure multiplier applied to the poll interval.
const MAX_BACKOFF_FACTOR: u32 = 4;

pub struct Poller {
    orchestrator: Arc<ScrapeOrchestrator>,
    interval: Duration,
    consecutive_failures: u32,
}

impl Poller {
    pub fn new(orchestrator: Arc<ScrapeOrchestrator>, interval_minutes: u64) -> Self {
        Self {
            orchestrator,
            interval: Duration::from_secs(interval_minutes * 60),
            consecutive_failures: 0,
        }
    }

    /// One poll cycle. Returns the delay before the next cycle, stretched
    /// when the upstream keeps failing so a dead page is not hammered.
    fn poll_once(&mut self) -> Duration {
        let start = Utc::now();

        match self.orchestrator.get_latest() {
            Ok((snapshot, from_cache)) => {
                if from_cache {
                    // Upstream is down but the cache answered; count it as a
                    // failure for backoff purposes.
                    self.consecutive_failures += 1;
                    eprintln!(
                        "✗ Poll fell back to cached snapshot from {}",
                        snapshot.fetched_at
                    );
                } else {
                    self.consecutive_failures = 0;
                    println!(
                        "✓ Poll complete: {} stations at {}",
                        snapshot.readings.len(),
                        snapshot.fetched_at
                    );
                }
            }
            Err(e) => {
                self.consecutive_failures += 1;
                eprintln!("✗ Poll error: {}", e);
            }
        }

        let factor = self.consecutive_failures.min(MAX_BACKOFF_FACTOR).max(1);
        let target = self.interval * factor;

        // Subtract time already spent scraping so intervals stay regular.
        let elapsed = (Utc::now() - start)
            .to_std()
            .unwrap_or(Duration::ZERO);
        target.saturating_sub(elapsed)
    }

    /// Main polling loop (runs indefinitely)
    pub fn run(mut self) {
        println!("🚀 Starting background poller...");
        println!("   Poll interval: {} seconds", self.interval.as_secs());

        loop {
            let sleep_for = self.poll_once();
            thread::sleep(sleep_for);
        }
    }

    /// Spawn the loop on its own thread.
    pub fn spawn(self) -> thread::JoinHandle<()> {
        thread::Builder::new()
            .name("floodwatch-poller".to_string())
            .spawn(move || self.run())
            .expect("spawning the poller thread failed")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
