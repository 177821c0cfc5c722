//! Domain errors of the authentication core and their mapping into [`AppError`].
//!
//! Authentication sub-cases are distinct here so they can be logged, but
//! they all collapse into one opaque "Unauthorized" at the boundary.

use std::time::Duration;

use thiserror::Error;
use tracing::{error, warn};

use bizhub_core::error::AppError;

/// Token encoding/decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The signature does not match the server secret.
    #[error("token signature is invalid")]
    InvalidSignature,
    /// The token is not a well-formed signed token.
    #[error("token is malformed")]
    Malformed,
    /// The token's expiry has passed.
    #[error("token has expired")]
    Expired,
    /// A token could not be produced.
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Per-request authentication and authorization failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token was presented.
    #[error("missing bearer token")]
    MissingToken,
    /// The token failed signature or format validation.
    #[error("invalid token")]
    InvalidToken,
    /// The token has expired.
    #[error("expired token")]
    ExpiredToken,
    /// The token was revoked by logout.
    #[error("revoked token")]
    Revoked,
    /// No live session record backs the token.
    #[error("session inactive")]
    SessionInactive,
    /// The principal may not access the route.
    #[error("forbidden route: {route}")]
    Forbidden {
        /// The route that was refused.
        route: String,
    },
    /// The operation is restricted to the company owner.
    #[error("owner required")]
    OwnerRequired,
    /// A durable store could not be reached; the request fails closed.
    #[error("auth store unavailable: {0}")]
    Unavailable(AppError),
}

impl AuthError {
    /// Short, stable label used in logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::InvalidToken => "invalid_token",
            Self::ExpiredToken => "expired_token",
            Self::Revoked => "revoked",
            Self::SessionInactive => "session_inactive",
            Self::Forbidden { .. } => "forbidden",
            Self::OwnerRequired => "owner_required",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::ExpiredToken,
            TokenError::InvalidSignature | TokenError::Malformed => Self::InvalidToken,
            TokenError::Encoding(msg) => Self::Unavailable(AppError::internal(msg)),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden { route } => {
                AppError::forbidden("You do not have permission to access this route")
                    .with_details(serde_json::json!({ "route": route }))
            }
            AuthError::OwnerRequired => {
                AppError::forbidden("Only the company owner can perform this action")
            }
            AuthError::Unavailable(source) => {
                error!(error = %source, "Authentication store unavailable");
                AppError::service_unavailable("Authentication is temporarily unavailable")
            }
            other => {
                warn!(reason = other.reason(), "Authentication failed");
                AppError::unauthorized("Unauthorized")
            }
        }
    }
}

/// Login failures.
#[derive(Debug, Error)]
pub enum LoginError {
    /// Unknown email, inactive account or business, or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Too many attempts from this client in the current window.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Time until the window resets.
        retry_after: Duration,
    },
    /// A durable store could not be reached.
    #[error("login unavailable: {0}")]
    Unavailable(AppError),
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => AppError::unauthorized("Invalid email or password"),
            LoginError::RateLimited { retry_after } => {
                AppError::rate_limited("Too many login attempts. Please try again later.")
                    .with_details(serde_json::json!({
                        "retry_after_seconds": retry_after_seconds(retry_after)
                    }))
            }
            LoginError::Unavailable(source) => {
                error!(error = %source, "Login store unavailable");
                AppError::service_unavailable("Login is temporarily unavailable")
            }
        }
    }
}

/// Logout failures.
#[derive(Debug, Error)]
pub enum LogoutError {
    /// The token presented for logout is not a valid token of this server.
    #[error("invalid token")]
    InvalidToken,
    /// The session registry could not be reached.
    #[error("logout unavailable: {0}")]
    Unavailable(AppError),
}

impl From<LogoutError> for AppError {
    fn from(err: LogoutError) -> Self {
        match err {
            LogoutError::InvalidToken => {
                warn!(reason = "invalid_token", "Logout with unusable token");
                AppError::unauthorized("Unauthorized")
            }
            LogoutError::Unavailable(source) => {
                error!(error = %source, "Logout store unavailable");
                AppError::service_unavailable("Logout is temporarily unavailable")
            }
        }
    }
}

/// Registration failures.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// The submitted data breaks a registration rule.
    #[error("invalid registration: {0}")]
    Invalid(String),
    /// An account already uses this email.
    #[error("email already registered")]
    EmailTaken,
    /// A durable store could not be reached.
    #[error("registration unavailable: {0}")]
    Unavailable(AppError),
}

impl From<RegisterError> for AppError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Invalid(message) => AppError::validation(message),
            RegisterError::EmailTaken => {
                AppError::conflict("An account with this email already exists")
            }
            RegisterError::Unavailable(source) => {
                error!(error = %source, "Registration store unavailable");
                AppError::service_unavailable("Registration is temporarily unavailable")
            }
        }
    }
}

/// Whole seconds to wait, rounded up and never zero.
pub fn retry_after_seconds(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}
