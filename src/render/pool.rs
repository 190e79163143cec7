/// Bounded render-slot pool.
///
/// Headless Chromium sessions are heavy (hundreds of MB each), so the number
/// running at once is capped. Callers block until a slot frees up rather
/// than spawning unbounded sessions under load. Release is tied to a guard's
/// Drop, so a slot comes back on every exit path — success, timeout, error,
/// or panic in the wrapped renderer.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use super::{PageRenderer, RenderError, RenderedPage};

/// Shared slot accounting. `held` counts slots currently out.
struct Slots {
    held: Mutex<usize>,
    freed: Condvar,
    capacity: usize,
}

/// RAII guard for one render slot; returns it on Drop.
struct SlotGuard {
    slots: Arc<Slots>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut held = match self.slots.held.lock() {
            Ok(guard) => guard,
            // A poisoned lock still holds a valid count; recover it so the
            // slot is not lost.
            Err(poisoned) => poisoned.into_inner(),
        };
        *held -= 1;
        self.slots.freed.notify_one();
    }
}

/// Wraps any renderer with bounded concurrent access.
///
/// Implements `PageRenderer` itself, so the orchestrator cannot tell a
/// pooled renderer from a bare one.
pub struct RenderPool {
    inner: Arc<dyn PageRenderer>,
    slots: Arc<Slots>,
}

impl RenderPool {
    /// # Panics
    /// Panics if `capacity` is zero; a pool that can never grant a slot
    /// would deadlock every caller.
    pub fn new(inner: Arc<dyn PageRenderer>, capacity: usize) -> Self {
        assert!(capacity >= 1, "render pool capacity must be at least 1");
        Self {
            inner,
            slots: Arc::new(Slots {
                held: Mutex::new(0),
                freed: Condvar::new(),
                capacity,
            }),
        }
    }

    /// Slots currently held. Zero whenever no render call is in flight.
    pub fn outstanding(&self) -> usize {
        match self.slots.held.lock() {
            Ok(held) => *held,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Blocks until a slot is available, then takes it.
    fn acquire(&self) -> SlotGuard {
        let mut held = match self.slots.held.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while *held >= self.slots.capacity {
            held = match self.slots.freed.wait(held) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
        *held += 1;
        SlotGuard {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl PageRenderer for RenderPool {
    fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, RenderError> {
        let _slot = self.acquire();
        self.inner.render(url, timeout)
        // _slot drops here, releasing the slot on every path.
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// Test renderer that records its peak concurrency and can be told to
    /// fail, sleep, or panic.
    struct ProbeRenderer {
        active: AtomicUsize,
        peak: AtomicUsize,
        hold_for: Duration,
        fail: bool,
    }

    impl ProbeRenderer {
        fn new(hold_for: Duration, fail: bool) -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                hold_for,
                fail,
            }
        }
    }

    impl PageRenderer for ProbeRenderer {
        fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, RenderError> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now_active, Ordering::SeqCst);
            thread::sleep(self.hold_for);
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                Err(RenderError::Timeout {
                    url: url.to_string(),
                    budget: timeout,
                })
            } else {
                Ok(RenderedPage {
                    html: "<html></html>".to_string(),
                    fetched_at: Utc::now(),
                })
            }
        }
    }

    #[test]
    fn test_pool_limits_concurrency_to_capacity() {
        let probe = Arc::new(ProbeRenderer::new(Duration::from_millis(50), false));
        let pool = Arc::new(RenderPool::new(probe.clone() as Arc<dyn PageRenderer>, 2));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    pool.render("https://example.test/table.do", Duration::from_secs(1))
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("render thread should not panic").unwrap();
        }

        assert!(
            probe.peak.load(Ordering::SeqCst) <= 2,
            "no more than capacity renders may run at once, saw {}",
            probe.peak.load(Ordering::SeqCst)
        );
        assert_eq!(pool.outstanding(), 0, "all slots must return after the burst");
    }

    #[test]
    fn test_slots_release_on_failure() {
        let probe = Arc::new(ProbeRenderer::new(Duration::from_millis(5), true));
        let pool = Arc::new(RenderPool::new(probe as Arc<dyn PageRenderer>, 1));

        // More failing calls than capacity: if a failure leaked its slot,
        // a later call would block forever.
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    pool.render("https://example.test/table.do", Duration::from_secs(1))
                })
            })
            .collect();

        for handle in handles {
            let result = handle.join().expect("render thread should not panic");
            assert!(result.is_err(), "probe is configured to fail");
        }

        assert_eq!(pool.outstanding(), 0, "failed renders must still free their slots");
    }

    #[test]
    fn test_slot_returns_even_when_renderer_panics() {
        struct PanickingRenderer;
        impl PageRenderer for PanickingRenderer {
            fn render(&self, _url: &str, _timeout: Duration) -> Result<RenderedPage, RenderError> {
                panic!("engine exploded");
            }
        }

        let pool = Arc::new(RenderPool::new(Arc::new(PanickingRenderer), 1));

        let crashing = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.render("https://example.test", Duration::from_secs(1)))
        };
        assert!(crashing.join().is_err(), "the renderer panic propagates");

        // The guard's Drop ran during unwinding, so the slot is back and a
        // fresh pool user would not deadlock.
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn test_zero_capacity_is_rejected() {
        struct NeverRenderer;
        impl PageRenderer for NeverRenderer {
            fn render(&self, _url: &str, _timeout: Duration) -> Result<RenderedPage, RenderError> {
                unreachable!()
            }
        }
        let _ = RenderPool::new(Arc::new(NeverRenderer), 0);
    }
}
