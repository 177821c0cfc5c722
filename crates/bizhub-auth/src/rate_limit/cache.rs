//! Shared-cache fixed-window rate limiter.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::warn;

use bizhub_cache::keys;
use bizhub_cache::provider::CacheManager;
use bizhub_core::traits::{CacheProvider, Clock};

use super::{RateDecision, RateLimiter};

/// Rate limiter counting attempts in the shared cache.
///
/// Windows are aligned to multiples of the window length so every node
/// agrees on the counter key. When the cache is unreachable the limiter
/// fails open and logs.
#[derive(Debug, Clone)]
pub struct CacheRateLimiter {
    cache: Arc<CacheManager>,
    clock: Arc<dyn Clock>,
    scope: String,
}

impl CacheRateLimiter {
    pub fn new(cache: Arc<CacheManager>, clock: Arc<dyn Clock>, scope: impl Into<String>) -> Self {
        Self {
            cache,
            clock,
            scope: scope.into(),
        }
    }
}

#[async_trait]
impl RateLimiter for CacheRateLimiter {
    async fn check(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        let now = self.clock.now().timestamp();
        let window_secs = window.num_seconds().max(1);
        let window_start = now - now.rem_euclid(window_secs);
        let reset_at = window_start + window_secs;
        let counter_key = keys::rate_limit(&self.scope, key, window_start);

        let count = match self.cache.incr(&counter_key).await {
            Ok(count) => count,
            Err(e) => {
                warn!(scope = %self.scope, error = %e, "Rate limiter cache unavailable, allowing");
                return RateDecision::Allowed { remaining: limit };
            }
        };

        if count == 1 {
            let ttl = std::time::Duration::from_secs((reset_at - now).max(1) as u64);
            if let Err(e) = self.cache.expire(&counter_key, ttl).await {
                warn!(scope = %self.scope, error = %e, "Failed to set rate-limit window expiry");
            }
        }

        if count > i64::from(limit) {
            return RateDecision::Denied {
                retry_after: std::time::Duration::from_secs((reset_at - now).max(0) as u64),
            };
        }

        RateDecision::Allowed {
            remaining: limit.saturating_sub(count as u32),
        }
    }
}
