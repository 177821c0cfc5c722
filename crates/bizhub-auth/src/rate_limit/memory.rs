//! In-process fixed-window rate limiter.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use bizhub_core::traits::Clock;

use super::{RateDecision, RateLimiter};

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Rate limiter holding windows in a [`DashMap`].
///
/// Expired windows are reset lazily on access and swept in bulk at most
/// once per `sweep_interval`, so idle keys do not accumulate.
#[derive(Debug)]
pub struct MemoryRateLimiter {
    windows: DashMap<String, Window>,
    clock: Arc<dyn Clock>,
    sweep_interval: Duration,
    /// Millisecond timestamp of the last sweep.
    last_sweep: AtomicI64,
}

impl MemoryRateLimiter {
    pub fn new(clock: Arc<dyn Clock>, sweep_interval: Duration) -> Self {
        let started = clock.now().timestamp_millis();
        Self {
            windows: DashMap::new(),
            clock,
            sweep_interval,
            last_sweep: AtomicI64::new(started),
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Drop every window that has ended. Only one caller wins each interval.
    fn maybe_sweep(&self, now: DateTime<Utc>) {
        let now_ms = now.timestamp_millis();
        let last = self.last_sweep.load(Ordering::Acquire);
        if now_ms - last < self.sweep_interval.num_milliseconds() {
            return;
        }
        if self
            .last_sweep
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let before = self.windows.len();
        self.windows.retain(|_, window| window.reset_at > now);
        debug!(
            removed = before.saturating_sub(self.windows.len()),
            "Swept expired rate-limit windows"
        );
    }
}

#[async_trait]
impl RateLimiter for MemoryRateLimiter {
    async fn check(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        let now = self.clock.now();
        // Sweep before taking an entry guard; retain locks every shard.
        self.maybe_sweep(now);

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + window,
        });

        if entry.reset_at <= now {
            entry.count = 0;
            entry.reset_at = now + window;
        }

        if entry.count >= limit {
            let retry_after = (entry.reset_at - now).to_std().unwrap_or_default();
            return RateDecision::Denied { retry_after };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: limit - entry.count,
        }
    }
}
