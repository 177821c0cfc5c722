//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use bizhub_auth::{AccessAdmin, AuthGateway};
use bizhub_cache::CacheManager;
use bizhub_core::config::ServerConfig;
use bizhub_database::{AuditQuery, DatabasePool};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// HTTP server settings (CORS).
    pub server: Arc<ServerConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL pool; `None` when running on in-memory stores.
    pub database: Option<DatabasePool>,
    /// Cache manager (Redis or in-memory)
    pub cache: Arc<CacheManager>,

    // ── Auth ─────────────────────────────────────────────────
    /// Authentication and authorization entry point
    pub gateway: Arc<AuthGateway>,
    /// Owner-only role administration
    pub admin: Arc<AccessAdmin>,
    /// Read side of the audit log
    pub audit_log: Arc<dyn AuditQuery>,
}
