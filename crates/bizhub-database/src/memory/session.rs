//! In-memory session store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use bizhub_core::result::AppResult;
use bizhub_entity::session::{CreateSessionRecord, SessionRecord};

use super::directory::MemoryDirectory;
use crate::repositories::SessionStore;

/// In-memory implementation of [`SessionStore`].
///
/// Liveness consults the shared [`MemoryDirectory`] so deactivating an
/// account or business immediately invalidates its sessions. The expiry
/// sweep drops expired records instead of keeping them as inactive rows.
#[derive(Debug)]
pub struct MemorySessionStore {
    directory: Arc<MemoryDirectory>,
    records: RwLock<HashMap<Uuid, SessionRecord>>,
}

impl MemorySessionStore {
    /// Create an empty store bound to a directory.
    pub fn new(directory: Arc<MemoryDirectory>) -> Self {
        Self {
            directory,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Records held for an account, including logged-out ones not yet swept.
    pub async fn records_for(&self, account_id: Uuid) -> Vec<SessionRecord> {
        let records = self.records.read().await;
        let mut found: Vec<SessionRecord> = records
            .values()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_at);
        found
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, record: CreateSessionRecord) -> AppResult<SessionRecord> {
        let created = SessionRecord {
            id: Uuid::new_v4(),
            business_id: record.business_id,
            account_id: record.account_id,
            token_digest: record.token_digest,
            expires_at: record.expires_at,
            active: true,
            created_at: Utc::now(),
        };
        self.records
            .write()
            .await
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_live(
        &self,
        token_digest: &str,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionRecord>> {
        let candidate = {
            let records = self.records.read().await;
            records
                .values()
                .find(|r| {
                    r.token_digest == token_digest && r.account_id == account_id && r.is_live(now)
                })
                .cloned()
        };
        let Some(record) = candidate else {
            return Ok(None);
        };
        if self
            .directory
            .is_account_live(record.account_id, record.business_id)
            .await
        {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    async fn deactivate(&self, token_digest: &str, account_id: Uuid) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let mut changed = 0;
        for record in records.values_mut() {
            if record.token_digest == token_digest && record.account_id == account_id && record.active
            {
                record.active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let mut changed = 0;
        records.retain(|_, record| {
            if record.expires_at > now {
                return true;
            }
            if record.active {
                changed += 1;
            }
            false
        });
        Ok(changed)
    }
}
