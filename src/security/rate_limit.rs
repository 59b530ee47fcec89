//! Fixed-window rate limiting keyed by client identifier.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::clock::Clock;

/// Counter for one identifier inside its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    /// Unix millis after which the window is considered elapsed.
    pub window_reset_at: u64,
}

/// Per-identifier fixed-window counter.
///
/// Check-and-increment happens under the map's per-key entry lock, so two
/// concurrent first requests for the same identifier cannot both open a window.
/// State is process-local: running N replicas admits up to N times the limit.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    max_requests: u32,
    window_ms: u64,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window_ms,
            clock,
        }
    }

    pub fn from_config(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.max_requests, config.window_ms, clock)
    }

    /// Record a request from `identifier` and report whether it is admitted.
    ///
    /// Rejected requests do not increment the counter.
    pub fn is_allowed(&self, identifier: &str) -> bool {
        let now = self.clock.now_millis();
        let fresh = RateLimitEntry {
            count: 1,
            window_reset_at: now.saturating_add(self.window_ms),
        };

        match self.entries.entry(identifier.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                true
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if now > entry.window_reset_at {
                    *entry = fresh;
                    true
                } else if entry.count >= self.max_requests {
                    false
                } else {
                    entry.count += 1;
                    true
                }
            }
        }
    }

    /// Requests `identifier` may still make in its current window.
    pub fn remaining_requests(&self, identifier: &str) -> u32 {
        let now = self.clock.now_millis();
        match self.entries.get(identifier) {
            Some(entry) if now <= entry.window_reset_at => {
                self.max_requests.saturating_sub(entry.count)
            }
            _ => self.max_requests,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Number of identifiers currently tracked.
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }

    /// Drop every entry whose window has elapsed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.window_reset_at);
        before.saturating_sub(self.entries.len())
    }

    /// Run [`sweep`](Self::sweep) every `every` until `shutdown` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        every: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        let tracked = limiter.tracked();
                        metrics::record_rate_limit_entries(tracked);
                        if removed > 0 {
                            tracing::debug!(removed, tracked, "Swept expired rate limit entries");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate limit sweeper stopped");
                        break;
                    }
                }
            }
        })
    }
}
