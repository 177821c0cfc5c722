//! # bizhub-auth
//!
//! Authentication and authorization core for BizHub.
//!
//! ## Modules
//!
//! - `token` — signed bearer tokens and their storage digests
//! - `revocation` — fast-path blacklist of logged-out tokens
//! - `session` — durable issued-token registry and its expiry sweep
//! - `rate_limit` — fixed-window login throttling
//! - `permission` — tenant-scoped route authorization with owner bypass
//! - `password` — Argon2id password hashing
//! - `audit` — best-effort audit recording
//! - `gateway` — per-request authenticate/authorize, registration, login and logout
//! - `admin` — owner-only role and route-grant administration

pub mod admin;
pub mod audit;
pub mod error;
pub mod gateway;
pub mod password;
pub mod permission;
pub mod rate_limit;
pub mod revocation;
pub mod session;
pub mod token;

pub use admin::AccessAdmin;
pub use audit::AuditRecorder;
pub use error::{AuthError, LoginError, LogoutError, RegisterError, TokenError};
pub use gateway::{AuthGateway, ClientContext, LoginResult, Principal};
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use permission::{AccessDecision, PermissionResolver};
pub use rate_limit::{CacheRateLimiter, MemoryRateLimiter, RateDecision, RateLimiter};
pub use revocation::RevocationStore;
pub use session::{SessionCleanup, SessionRegistry};
pub use token::{Claims, TokenCodec, TokenDigest, TokenHasher};
