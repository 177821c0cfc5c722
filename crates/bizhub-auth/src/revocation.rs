//! Fast-path blacklist of logged-out tokens.
//!
//! Entries are keyed by token digest and live exactly as long as the
//! token they revoke. The session registry remains the authority: losing
//! this cache only costs a durable lookup, never admits a revoked token.

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use bizhub_cache::keys;
use bizhub_cache::provider::CacheManager;
use bizhub_core::result::AppResult;
use bizhub_core::traits::{CacheProvider, Clock};

use crate::token::TokenHasher;

/// Cache-backed token revocation list.
#[derive(Debug, Clone)]
pub struct RevocationStore {
    cache: Arc<CacheManager>,
    clock: Arc<dyn Clock>,
}

impl RevocationStore {
    pub fn new(cache: Arc<CacheManager>, clock: Arc<dyn Clock>) -> Self {
        Self { cache, clock }
    }

    /// Revoke `raw` for `ttl`. Idempotent.
    ///
    /// A non-positive `ttl` means the token is already expired and
    /// nothing is written.
    pub async fn revoke(&self, raw: &str, ttl: Duration) -> AppResult<()> {
        let Ok(std_ttl) = ttl.to_std() else {
            return Ok(());
        };
        if std_ttl.is_zero() {
            return Ok(());
        }

        let digest = TokenHasher::digest(raw);
        let revoked_until = (self.clock.now() + ttl).timestamp();
        self.cache
            .set(
                &keys::revoked_token(digest.as_str()),
                &revoked_until.to_string(),
                std_ttl,
            )
            .await?;

        debug!(digest = %digest, ttl_seconds = ttl.num_seconds(), "Token revoked");
        Ok(())
    }

    /// Whether `raw` is currently revoked.
    pub async fn is_revoked(&self, raw: &str) -> AppResult<bool> {
        let digest = TokenHasher::digest(raw);
        let Some(value) = self.cache.get(&keys::revoked_token(digest.as_str())).await? else {
            return Ok(false);
        };

        // The stored deadline guards against providers that expire lazily.
        match value.parse::<i64>() {
            Ok(until) => Ok(self.clock.now().timestamp() < until),
            Err(_) => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizhub_cache::memory::MemoryCacheProvider;
    use bizhub_core::config::cache::MemoryCacheConfig;
    use bizhub_core::traits::ManualClock;

    fn store() -> (RevocationStore, Arc<ManualClock>) {
        let provider = MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 100 }, 60);
        let cache = Arc::new(CacheManager::from_provider(Arc::new(provider)));
        let clock = Arc::new(ManualClock::default());
        (RevocationStore::new(cache, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_revoke_is_visible() {
        let (store, _clock) = store();
        assert!(!store.is_revoked("tok").await.unwrap());
        store.revoke("tok", Duration::hours(1)).await.unwrap();
        assert!(store.is_revoked("tok").await.unwrap());
        assert!(!store.is_revoked("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (store, _clock) = store();
        store.revoke("tok", Duration::hours(1)).await.unwrap();
        store.revoke("tok", Duration::hours(1)).await.unwrap();
        assert!(store.is_revoked("tok").await.unwrap());
    }

    #[tokio::test]
    async fn test_entry_ends_with_token_lifetime() {
        let (store, clock) = store();
        store.revoke("tok", Duration::minutes(10)).await.unwrap();
        clock.advance(Duration::minutes(9));
        assert!(store.is_revoked("tok").await.unwrap());
        clock.advance(Duration::minutes(1));
        assert!(!store.is_revoked("tok").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_not_written() {
        let (store, _clock) = store();
        store.revoke("tok", Duration::zero()).await.unwrap();
        store.revoke("tok", Duration::seconds(-5)).await.unwrap();
        assert!(!store.is_revoked("tok").await.unwrap());
    }
}
