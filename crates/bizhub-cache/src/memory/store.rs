//! In-memory cache implementation using the moka crate.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use bizhub_core::config::cache::MemoryCacheConfig;
use bizhub_core::error::{AppError, ErrorKind};
use bizhub_core::result::AppResult;
use bizhub_core::traits::cache::CacheProvider;

/// A cached value with the TTL it should (re)start with.
///
/// `ttl: None` on an update keeps the entry's current deadline, which is
/// how counters are incremented without extending their window.
#[derive(Debug, Clone)]
struct Slot {
    value: String,
    ttl: Option<Duration>,
}

/// Per-entry expiry policy.
#[derive(Debug, Clone, Copy)]
struct SlotExpiry {
    default_ttl: Duration,
}

impl Expiry<String, Slot> for SlotExpiry {
    fn expire_after_create(&self, _key: &String, slot: &Slot, _created_at: Instant) -> Option<Duration> {
        Some(slot.ttl.unwrap_or(self.default_ttl))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        slot: &Slot,
        _updated_at: Instant,
        duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        slot.ttl.or(duration_until_expiry)
    }
}

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    cache: Cache<String, Slot>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig, default_ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(SlotExpiry {
                default_ttl: Duration::from_secs(default_ttl_seconds),
            })
            .build();

        Self { cache }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|slot| slot.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.cache
            .insert(
                key.to_string(),
                Slot {
                    value: value.to_string(),
                    ttl: Some(ttl),
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.contains_key(key))
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        let entry = self
            .cache
            .entry(key.to_string())
            .and_upsert_with(|existing| {
                let slot = match existing.map(|e| e.into_value()) {
                    Some(slot) => match slot.value.parse::<i64>() {
                        Ok(n) => Slot {
                            value: (n + 1).to_string(),
                            ttl: None,
                        },
                        Err(_) => Slot { ttl: None, ..slot },
                    },
                    None => Slot {
                        value: "1".to_string(),
                        ttl: None,
                    },
                };
                std::future::ready(slot)
            })
            .await;

        entry.into_value().value.parse::<i64>().map_err(|e| {
            AppError::with_source(
                ErrorKind::Cache,
                format!("Value at '{key}' is not an integer"),
                e,
            )
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        match self.cache.get(key).await {
            Some(slot) => {
                self.cache
                    .insert(
                        key.to_string(),
                        Slot {
                            value: slot.value,
                            ttl: Some(ttl),
                        },
                    )
                    .await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
