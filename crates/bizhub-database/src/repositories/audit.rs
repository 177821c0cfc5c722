//! Audit sink: append-only audit log.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use bizhub_core::error::{AppError, ErrorKind};
use bizhub_core::result::AppResult;
use bizhub_entity::audit::{AuditLogEntry, CreateAuditLogEntry};

/// Append-only destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync + std::fmt::Debug + 'static {
    /// Append one event.
    async fn record(&self, entry: CreateAuditLogEntry) -> AppResult<()>;
}

/// Read access to the audit log.
#[async_trait]
pub trait AuditQuery: Send + Sync + std::fmt::Debug + 'static {
    /// Most recent entries for a business, newest first.
    async fn find_recent(&self, business_id: Uuid, limit: i64) -> AppResult<Vec<AuditLogEntry>>;
}

/// PostgreSQL implementation of [`AuditSink`].
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditQuery for AuditLogRepository {
    async fn find_recent(&self, business_id: Uuid, limit: i64) -> AppResult<Vec<AuditLogEntry>> {
        sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_logs WHERE business_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(business_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list audit entries", e))
    }
}

#[async_trait]
impl AuditSink for AuditLogRepository {
    async fn record(&self, entry: CreateAuditLogEntry) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs \
             (id, business_id, account_id, context, description, ip_address, user_agent, additional_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(entry.business_id)
        .bind(entry.account_id)
        .bind(entry.context)
        .bind(&entry.description)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(&entry.additional_data)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to write audit entry", e))?;
        Ok(())
    }
}
