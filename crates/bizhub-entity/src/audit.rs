//! Audit log entry entity model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Category of a security- or business-relevant event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_context", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditContext {
    /// Successful login.
    AuthLogin,
    /// Logout.
    AuthLogout,
    /// Password recovery requested.
    AuthRecovery,
    /// Failed login or refused authorization.
    AuthDeny,
    /// Password changed.
    AuthPasswordChange,
    /// Account created.
    AccountCreate,
    /// Account updated.
    AccountUpdate,
    /// Account deactivated.
    AccountDeactivate,
    /// Role assigned to an account.
    AccountRoleAdd,
    /// Role removed from an account.
    AccountRoleRemove,
    /// Business created.
    BusinessCreate,
    /// Business updated.
    BusinessUpdate,
    /// Profile updated.
    ProfileUpdate,
    /// Preferences updated.
    PreferencesUpdate,
    /// Theme changed.
    ThemeChange,
    /// Session created.
    SessionCreate,
    /// Session revoked.
    SessionRevoke,
    /// Role created.
    RoleCreate,
    /// Role updated (including route grant changes).
    RoleUpdate,
    /// Role deactivated.
    RoleDelete,
    /// Bank account created.
    BankAccountCreate,
    /// Bank account updated.
    BankAccountUpdate,
    /// Bank account deleted.
    BankAccountDelete,
}

impl AuditContext {
    /// Return the context as its snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthLogin => "auth_login",
            Self::AuthLogout => "auth_logout",
            Self::AuthRecovery => "auth_recovery",
            Self::AuthDeny => "auth_deny",
            Self::AuthPasswordChange => "auth_password_change",
            Self::AccountCreate => "account_create",
            Self::AccountUpdate => "account_update",
            Self::AccountDeactivate => "account_deactivate",
            Self::AccountRoleAdd => "account_role_add",
            Self::AccountRoleRemove => "account_role_remove",
            Self::BusinessCreate => "business_create",
            Self::BusinessUpdate => "business_update",
            Self::ProfileUpdate => "profile_update",
            Self::PreferencesUpdate => "preferences_update",
            Self::ThemeChange => "theme_change",
            Self::SessionCreate => "session_create",
            Self::SessionRevoke => "session_revoke",
            Self::RoleCreate => "role_create",
            Self::RoleUpdate => "role_update",
            Self::RoleDelete => "role_delete",
            Self::BankAccountCreate => "bank_account_create",
            Self::BankAccountUpdate => "bank_account_update",
            Self::BankAccountDelete => "bank_account_delete",
        }
    }

    const ALL: [AuditContext; 23] = [
        Self::AuthLogin,
        Self::AuthLogout,
        Self::AuthRecovery,
        Self::AuthDeny,
        Self::AuthPasswordChange,
        Self::AccountCreate,
        Self::AccountUpdate,
        Self::AccountDeactivate,
        Self::AccountRoleAdd,
        Self::AccountRoleRemove,
        Self::BusinessCreate,
        Self::BusinessUpdate,
        Self::ProfileUpdate,
        Self::PreferencesUpdate,
        Self::ThemeChange,
        Self::SessionCreate,
        Self::SessionRevoke,
        Self::RoleCreate,
        Self::RoleUpdate,
        Self::RoleDelete,
        Self::BankAccountCreate,
        Self::BankAccountUpdate,
        Self::BankAccountDelete,
    ];
}

impl fmt::Display for AuditContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuditContext {
    type Err = bizhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| {
                bizhub_core::AppError::validation(format!("Invalid audit context: '{s}'"))
            })
    }
}

/// An immutable audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Unique audit entry identifier.
    pub id: Uuid,
    /// Business the event happened in.
    pub business_id: Uuid,
    /// Acting account, when known.
    pub account_id: Option<Uuid>,
    /// Event category.
    pub context: AuditContext,
    /// Human-readable description.
    pub description: String,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client User-Agent.
    pub user_agent: Option<String>,
    /// Additional structured data.
    pub additional_data: Option<serde_json::Value>,
    /// When the event occurred.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    /// Business the event happened in.
    pub business_id: Uuid,
    /// Acting account, when known.
    pub account_id: Option<Uuid>,
    /// Event category.
    pub context: AuditContext,
    /// Human-readable description.
    pub description: String,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client User-Agent.
    pub user_agent: Option<String>,
    /// Additional structured data.
    pub additional_data: Option<serde_json::Value>,
}

impl CreateAuditLogEntry {
    /// Start an entry with the mandatory fields.
    pub fn new(
        business_id: Uuid,
        account_id: Option<Uuid>,
        context: AuditContext,
        description: impl Into<String>,
    ) -> Self {
        Self {
            business_id,
            account_id,
            context,
            description: description.into(),
            ip_address: None,
            user_agent: None,
            additional_data: None,
        }
    }

    /// Attach client network details.
    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    /// Attach structured data.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.additional_data = Some(data);
        self
    }
}
