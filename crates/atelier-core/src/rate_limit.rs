//! Fixed-window request throttling keyed by client.
//!
//! Each client key gets a window that opens on its first request. Within the
//! window at most `max_requests` are allowed; once the window has ended the
//! next request opens a fresh one. State is in-memory and per-process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::config::RateLimitConfig;

/// Shortest window accepted; a zero window would make the sweeper spin
const MIN_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    pub reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    pub reset_at: Instant,
}

impl RateLimitDecision {
    /// Time until the window resets, measured from `now`
    pub fn retry_after(&self, now: Instant) -> Duration {
        self.reset_at.saturating_duration_since(now)
    }
}

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window: window.max(MIN_WINDOW),
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, RateLimitRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// Count a request from `key` at `now` and decide whether it may proceed
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut records = self.records();

        let record = records
            .entry(key.to_string())
            .and_modify(|record| {
                if now >= record.reset_at {
                    *record = RateLimitRecord {
                        count: 0,
                        reset_at: now + self.window,
                    };
                }
            })
            .or_insert(RateLimitRecord {
                count: 0,
                reset_at: now + self.window,
            });

        if record.count >= self.max_requests {
            debug!(key, reset_in_ms = record.reset_at.saturating_duration_since(now).as_millis() as u64, "Rate limit exceeded");
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: record.reset_at,
            };
        }

        record.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests - record.count,
            reset_at: record.reset_at,
        }
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Drop records whose window has ended, returning how many were removed
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut records = self.records();
        let before = records.len();
        records.retain(|_, record| now < record.reset_at);
        before - records.len()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sweep stale records every window until the handle is aborted.
    /// Only long-running processes should start this.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.window);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = limiter.sweep();
                if removed > 0 {
                    debug!(removed, "Swept expired rate limit records");
                }
            }
        })
    }
}
