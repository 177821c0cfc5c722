//! Fixed-window rate limiting keyed by client.
//!
//! Two backends:
//! - `memory` — per-process windows in a concurrent map
//! - `cache` — window counters in the shared cache, for multi-node deployments

pub mod cache;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;

pub use cache::CacheRateLimiter;
pub use memory::MemoryRateLimiter;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The attempt was counted and is allowed.
    Allowed {
        /// Attempts left in the current window.
        remaining: u32,
    },
    /// The window's budget is spent.
    Denied {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Counts attempts per key in fixed windows.
///
/// At most `limit` attempts are allowed per key per window; the window
/// starts at the first attempt after the previous one ended.
#[async_trait]
pub trait RateLimiter: Send + Sync + std::fmt::Debug + 'static {
    /// Count an attempt for `key` and decide whether it may proceed.
    async fn check(&self, key: &str, limit: u32, window: chrono::Duration) -> RateDecision;
}
