//! Account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::business::Business;
use crate::preference::AccountPreference;

/// A login-capable member of exactly one business.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Unique account identifier.
    pub id: Uuid,
    /// Owning business.
    pub business_id: Uuid,
    /// Login email, stored lowercase.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name.
    pub name: Option<String>,
    /// Soft-delete flag.
    pub active: bool,
    /// Company owners bypass route-role checks within their business.
    pub is_company_owner: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// An account together with the business it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    /// The account.
    pub account: Account,
    /// Its business.
    pub business: Business,
}

impl AccountProfile {
    /// Both the account and its business are active.
    pub fn is_active(&self) -> bool {
        self.account.active && self.business.active && self.account.business_id == self.business.id
    }
}

/// Data required to open a business together with its owner account.
#[derive(Clone)]
pub struct CreateBusinessOwner {
    /// Display name of the new business.
    pub business_name: String,
    /// Owner's display name.
    pub owner_name: String,
    /// Owner's login email, already normalized.
    pub email: String,
    /// Hash of the owner's password.
    pub password_hash: String,
}

impl std::fmt::Debug for CreateBusinessOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateBusinessOwner")
            .field("business_name", &self.business_name)
            .field("owner_name", &self.owner_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// A newly opened business, its owner and the owner's default preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRegistration {
    pub profile: AccountProfile,
    pub preferences: AccountPreference,
}
