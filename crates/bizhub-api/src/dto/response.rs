//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bizhub_auth::permission::GrantSource;
use bizhub_entity::access::{AccountRole, RouteRole};
use bizhub_entity::account::AccountProfile;
use bizhub_entity::audit::{AuditContext, AuditLogEntry};
use bizhub_entity::preference::{AccountPreference, Theme};
use bizhub_entity::role::Role;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    pub token: String,
    /// Token expiration.
    pub expires_at: DateTime<Utc>,
    /// The signed-in account, its business and preferences.
    #[serde(flatten)]
    pub session: SessionResponse,
}

/// Who the caller is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub account: AccountResponse,
    pub business: BusinessResponse,
    pub preferences: PreferencesResponse,
}

impl SessionResponse {
    pub fn new(profile: AccountProfile, preferences: AccountPreference) -> Self {
        let AccountProfile { account, business } = profile;
        Self {
            account: AccountResponse {
                id: account.id,
                email: account.email,
                name: account.name,
                is_company_owner: account.is_company_owner,
                created_at: account.created_at,
            },
            business: BusinessResponse {
                id: business.id,
                name: business.name,
            },
            preferences: PreferencesResponse {
                theme: preferences.theme,
            },
        }
    }
}

/// Account summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_company_owner: bool,
    pub created_at: DateTime<Utc>,
}

/// Business summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessResponse {
    pub id: Uuid,
    pub name: String,
}

/// UI preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesResponse {
    pub theme: Theme,
}

/// Routes the caller can reach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesResponse {
    pub routes: Vec<String>,
}

/// Outcome of an access check that succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessResponse {
    pub route: String,
    pub allowed: bool,
    /// Why access was granted.
    pub source: GrantSource,
}

/// Role response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            color: role.color,
            created_at: role.created_at,
        }
    }
}

/// An account's role membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRoleResponse {
    pub account_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<AccountRole> for AccountRoleResponse {
    fn from(grant: AccountRole) -> Self {
        Self {
            account_id: grant.account_id,
            role_id: grant.role_id,
            created_at: grant.created_at,
        }
    }
}

/// A route granted to a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteGrantResponse {
    pub route: String,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<RouteRole> for RouteGrantResponse {
    fn from(grant: RouteRole) -> Self {
        Self {
            route: grant.route,
            role_id: grant.role_id,
            created_at: grant.created_at,
        }
    }
}

/// Audit log entry response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogResponse {
    pub id: Uuid,
    pub account_id: Option<Uuid>,
    pub context: AuditContext,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub additional_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogEntry> for AuditLogResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            account_id: entry.account_id,
            context: entry.context,
            description: entry.description,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            additional_data: entry.additional_data,
            created_at: entry.created_at,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub database: String,
    pub cache: String,
}
