//! Session store: durable records of issued tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bizhub_core::error::{AppError, ErrorKind};
use bizhub_core::result::AppResult;
use bizhub_entity::session::{CreateSessionRecord, SessionRecord};

/// Durable source of truth for issued tokens.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new, active session record.
    async fn create(&self, record: CreateSessionRecord) -> AppResult<SessionRecord>;

    /// Find the record for `token_digest` owned by `account_id` that is active,
    /// unexpired at `now`, and whose account and business are both active.
    async fn find_live(
        &self,
        token_digest: &str,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionRecord>>;

    /// Mark the matching record inactive. Only records owned by `account_id`
    /// are touched. Returns the number of rows changed.
    async fn deactivate(&self, token_digest: &str, account_id: Uuid) -> AppResult<u64>;

    /// Mark every active record that expired before `now` inactive.
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// PostgreSQL implementation of [`SessionStore`].
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn create(&self, record: CreateSessionRecord) -> AppResult<SessionRecord> {
        sqlx::query_as::<_, SessionRecord>(
            "INSERT INTO issued_tokens (id, business_id, account_id, token_digest, expires_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(record.business_id)
        .bind(record.account_id)
        .bind(&record.token_digest)
        .bind(record.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    async fn find_live(
        &self,
        token_digest: &str,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>(
            "SELECT t.* FROM issued_tokens t \
             JOIN accounts a ON a.id = t.account_id AND a.business_id = t.business_id \
             JOIN businesses b ON b.id = t.business_id \
             WHERE t.token_digest = $1 AND t.account_id = $2 AND t.active = TRUE \
               AND t.expires_at > $3 AND a.active = TRUE AND b.active = TRUE",
        )
        .bind(token_digest)
        .bind(account_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn deactivate(&self, token_digest: &str, account_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE issued_tokens SET active = FALSE \
             WHERE token_digest = $1 AND account_id = $2 AND active = TRUE",
        )
        .bind(token_digest)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to deactivate session", e))?;
        Ok(result.rows_affected())
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE issued_tokens SET active = FALSE WHERE active = TRUE AND expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to deactivate expired sessions", e)
        })?;
        Ok(result.rows_affected())
    }
}
