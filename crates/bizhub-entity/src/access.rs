//! Many-to-many grant rows: account to role, route to role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An account holding a role. All three ids belong to the same business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AccountRole {
    /// Owning business.
    pub business_id: Uuid,
    /// Account holding the role.
    pub account_id: Uuid,
    /// Role held.
    pub role_id: Uuid,
    /// When the grant was made.
    pub created_at: DateTime<Utc>,
}

/// A route granted to a role. The route is matched by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RouteRole {
    /// Owning business.
    pub business_id: Uuid,
    /// Route path, e.g. `/audit-logs`.
    pub route: String,
    /// Role granted the route.
    pub role_id: Uuid,
    /// When the grant was made.
    pub created_at: DateTime<Utc>,
}
