//! Authentication configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token lifetime in hours.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: u64,
    /// Login attempt throttling.
    #[serde(default)]
    pub login_rate_limit: RateLimitConfig,
    /// Upper bound on how long a request waits for an audit write.
    #[serde(default = "default_audit_timeout")]
    pub audit_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl(),
            login_rate_limit: RateLimitConfig::default(),
            audit_timeout_ms: default_audit_timeout(),
        }
    }
}

impl AuthConfig {
    /// Token lifetime as a [`chrono::Duration`].
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours as i64)
    }

    /// Audit write timeout as a [`Duration`].
    pub fn audit_timeout(&self) -> Duration {
        Duration::from_millis(self.audit_timeout_ms)
    }

    /// Reject configurations that would make the auth core unusable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if self.token_ttl_hours == 0 {
            return Err(AppError::configuration(
                "auth.token_ttl_hours must be greater than zero",
            ));
        }
        self.login_rate_limit.validate()
    }

    /// Whether the signing secret is still the shipped placeholder.
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == default_jwt_secret()
    }
}

/// Fixed-window rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum attempts allowed per window.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Window length in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
    /// Minimum spacing between sweeps of expired counters.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            window_seconds: default_window(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl RateLimitConfig {
    /// Window length as a [`chrono::Duration`].
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_seconds as i64)
    }

    /// Sweep spacing as a [`chrono::Duration`].
    pub fn sweep_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.sweep_interval_seconds as i64)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.limit == 0 || self.window_seconds == 0 {
            return Err(AppError::configuration(
                "auth.login_rate_limit limit and window_seconds must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_token_ttl() -> u64 {
    168
}

fn default_limit() -> u32 {
    5
}

fn default_window() -> u64 {
    60
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_audit_timeout() -> u64 {
    500
}
