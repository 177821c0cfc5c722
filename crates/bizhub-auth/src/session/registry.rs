//! Session registry: the authoritative record of which tokens are live.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use bizhub_core::result::AppResult;
use bizhub_core::traits::Clock;
use bizhub_database::SessionStore;
use bizhub_entity::session::{CreateSessionRecord, SessionRecord};

use crate::token::TokenDigest;

/// Records issued tokens by digest and answers liveness queries.
///
/// A record is live while it is active, unexpired, and both its account
/// and business are active.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Persist a new active record for an issued token.
    pub async fn create(
        &self,
        business_id: Uuid,
        account_id: Uuid,
        digest: &TokenDigest,
        expires_at: DateTime<Utc>,
    ) -> AppResult<SessionRecord> {
        let record = self
            .store
            .create(CreateSessionRecord {
                business_id,
                account_id,
                token_digest: digest.as_str().to_string(),
                expires_at,
            })
            .await?;

        debug!(
            session_id = %record.id,
            account_id = %account_id,
            expires_at = %expires_at,
            "Session recorded"
        );
        Ok(record)
    }

    /// The live record for `digest` owned by `account_id`, if any.
    pub async fn live_record(
        &self,
        digest: &TokenDigest,
        account_id: Uuid,
    ) -> AppResult<Option<SessionRecord>> {
        self.store
            .find_live(digest.as_str(), account_id, self.clock.now())
            .await
    }

    /// Whether a live record exists for `digest` owned by `account_id`.
    pub async fn is_active(&self, digest: &TokenDigest, account_id: Uuid) -> AppResult<bool> {
        Ok(self.live_record(digest, account_id).await?.is_some())
    }

    /// Deactivate the record for `digest` owned by `account_id`.
    ///
    /// Returns `true` if a record changed state. Records of other accounts
    /// are never touched.
    pub async fn deactivate(&self, digest: &TokenDigest, account_id: Uuid) -> AppResult<bool> {
        let changed = self.store.deactivate(digest.as_str(), account_id).await?;
        Ok(changed > 0)
    }

    /// Deactivate every record whose expiry has passed.
    pub async fn deactivate_expired(&self) -> AppResult<u64> {
        self.store.deactivate_expired(self.clock.now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizhub_core::traits::ManualClock;
    use bizhub_database::{MemoryDirectory, MemorySessionStore};
    use chrono::Duration;

    use crate::token::TokenHasher;

    struct Fixture {
        registry: SessionRegistry,
        directory: Arc<MemoryDirectory>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(MemoryDirectory::new());
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemorySessionStore::new(directory.clone()));
        Fixture {
            registry: SessionRegistry::new(store, clock.clone()),
            directory,
            clock,
        }
    }

    #[tokio::test]
    async fn test_create_then_active() {
        let fx = fixture();
        let business = fx.directory.add_business("Acme").await;
        let account = fx
            .directory
            .add_account(business.id, "a@acme.test", "hash", false)
            .await
            .unwrap();
        let digest = TokenHasher::digest("tok");
        let expires = fx.clock.now() + Duration::hours(1);

        fx.registry
            .create(business.id, account.id, &digest, expires)
            .await
            .unwrap();

        assert!(fx.registry.is_active(&digest, account.id).await.unwrap());
        assert!(!fx.registry.is_active(&digest, Uuid::new_v4()).await.unwrap());
        assert!(
            !fx.registry
                .is_active(&TokenHasher::digest("other"), account.id)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_expired_record_not_active() {
        let fx = fixture();
        let business = fx.directory.add_business("Acme").await;
        let account = fx
            .directory
            .add_account(business.id, "a@acme.test", "hash", false)
            .await
            .unwrap();
        let digest = TokenHasher::digest("tok");
        fx.registry
            .create(business.id, account.id, &digest, fx.clock.now() + Duration::minutes(5))
            .await
            .unwrap();

        fx.clock.advance(Duration::minutes(5));
        assert!(!fx.registry.is_active(&digest, account.id).await.unwrap());
        assert_eq!(fx.registry.deactivate_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deactivate_scoped_to_owner() {
        let fx = fixture();
        let business = fx.directory.add_business("Acme").await;
        let owner = fx
            .directory
            .add_account(business.id, "a@acme.test", "hash", false)
            .await
            .unwrap();
        let digest = TokenHasher::digest("tok");
        fx.registry
            .create(business.id, owner.id, &digest, fx.clock.now() + Duration::hours(1))
            .await
            .unwrap();

        assert!(!fx.registry.deactivate(&digest, Uuid::new_v4()).await.unwrap());
        assert!(fx.registry.is_active(&digest, owner.id).await.unwrap());

        assert!(fx.registry.deactivate(&digest, owner.id).await.unwrap());
        assert!(!fx.registry.deactivate(&digest, owner.id).await.unwrap());
        assert!(!fx.registry.is_active(&digest, owner.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_account_not_active() {
        let fx = fixture();
        let business = fx.directory.add_business("Acme").await;
        let account = fx
            .directory
            .add_account(business.id, "a@acme.test", "hash", false)
            .await
            .unwrap();
        let digest = TokenHasher::digest("tok");
        fx.registry
            .create(business.id, account.id, &digest, fx.clock.now() + Duration::hours(1))
            .await
            .unwrap();

        fx.directory.set_business_active(business.id, false).await;
        assert!(!fx.registry.is_active(&digest, account.id).await.unwrap());
    }
}
