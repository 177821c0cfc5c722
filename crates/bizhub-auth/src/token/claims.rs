//! Token claim payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signed token payload.
///
/// Field names are camelCase on the wire so tokens issued by older
/// deployments keep decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// The authenticated account.
    pub account_id: Uuid,
    /// The tenant the account belongs to.
    pub business_id: Uuid,
    /// Email at the time of issue.
    pub email: String,
    /// Issued-at (UTC timestamp, seconds).
    pub iat: i64,
    /// Expiration (UTC timestamp, seconds).
    pub exp: i64,
    /// Unique token id; keeps tokens from the same second distinct.
    pub jti: Uuid,
}

impl Claims {
    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Issued-at as a timestamp.
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Who a token is being issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub account_id: Uuid,
    pub business_id: Uuid,
    pub email: String,
}

/// Claims read without checking the signature.
///
/// Only the expiry is exposed: nothing read this way may be used to make
/// an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnverifiedClaims {
    expires_at: DateTime<Utc>,
}

impl UnverifiedClaims {
    pub(crate) fn new(exp: i64) -> Self {
        Self {
            expires_at: DateTime::from_timestamp(exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// When the token claims to expire.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ExpiryOnly {
    pub exp: i64,
}
