//! Per-account UI preferences.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// UI color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "theme", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme (default for new accounts).
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// Preferences row, one per (business, account).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountPreference {
    /// Owning business.
    pub business_id: Uuid,
    /// Owning account.
    pub account_id: Uuid,
    /// Selected theme.
    pub theme: Theme,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}
