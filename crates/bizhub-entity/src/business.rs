//! Business (tenant) entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tenant. Every account, role and grant belongs to exactly one business.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Business {
    /// Unique business identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Inactive businesses invalidate every account they contain.
    pub active: bool,
    /// When the business was created.
    pub created_at: DateTime<Utc>,
    /// When the business was last updated.
    pub updated_at: DateTime<Utc>,
}
