//! In-memory audit sink.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use bizhub_core::error::AppError;
use bizhub_core::result::AppResult;
use bizhub_entity::audit::{AuditContext, AuditLogEntry, CreateAuditLogEntry};

use crate::repositories::{AuditQuery, AuditSink};

/// In-memory implementation of [`AuditSink`] and [`AuditQuery`].
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditLogEntry>>,
    failing: AtomicBool,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `record` call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every recorded entry, oldest first.
    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }

    /// Contexts of every recorded entry, oldest first.
    pub async fn contexts(&self) -> Vec<AuditContext> {
        self.entries.read().await.iter().map(|e| e.context).collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: CreateAuditLogEntry) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::database("Audit log unavailable"));
        }
        self.entries.write().await.push(AuditLogEntry {
            id: Uuid::new_v4(),
            business_id: entry.business_id,
            account_id: entry.account_id,
            context: entry.context,
            description: entry.description,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            additional_data: entry.additional_data,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl AuditQuery for MemoryAuditSink {
    async fn find_recent(&self, business_id: Uuid, limit: i64) -> AppResult<Vec<AuditLogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.business_id == business_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
