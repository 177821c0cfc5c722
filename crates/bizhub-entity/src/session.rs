//! Issued-token (session) entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Durable record of one issued token. Only the digest of the token is stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// Owning business.
    pub business_id: Uuid,
    /// Owning account.
    pub account_id: Uuid,
    /// SHA-256 hex digest of the raw token.
    pub token_digest: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// Cleared on logout or by the expiry sweep.
    pub active: bool,
    /// When the record was created (login time).
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Active and not yet expired at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at > now
    }
}

/// Data required to create a new session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRecord {
    /// Owning business.
    pub business_id: Uuid,
    /// Owning account.
    pub account_id: Uuid,
    /// Token digest.
    pub token_digest: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}
