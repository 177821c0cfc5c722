//! Tenant-scoped role entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named role inside one business. Inactive roles grant nothing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role identifier.
    pub id: Uuid,
    /// Owning business.
    pub business_id: Uuid,
    /// Name, unique among the business's active roles.
    pub name: String,
    /// Optional UI color (hex).
    pub color: Option<String>,
    /// Soft-delete flag.
    pub active: bool,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    /// Owning business.
    pub business_id: Uuid,
    /// Role name.
    pub name: String,
    /// Optional UI color.
    pub color: Option<String>,
}
