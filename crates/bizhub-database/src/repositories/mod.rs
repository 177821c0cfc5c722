//! Store traits consumed by the authentication core and their
//! PostgreSQL implementations.

pub mod access;
pub mod account;
pub mod audit;
pub mod session;

pub use access::{AccessRepository, AccessStore};
pub use account::{AccountRepository, AccountStore};
pub use audit::{AuditLogRepository, AuditQuery, AuditSink};
pub use session::{SessionRepository, SessionStore};

use bizhub_core::error::{AppError, ErrorKind};

/// Map a sqlx write error. Unique violations become `Conflict`; foreign-key
/// violations (a grant crossing business boundaries) become `Validation`.
pub(crate) fn map_write_error(err: sqlx::Error, message: &str, conflict: &str) -> AppError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => AppError::conflict(conflict),
        Some(db) if db.is_foreign_key_violation() => {
            AppError::validation("Referenced record does not belong to this business")
        }
        _ => AppError::with_source(ErrorKind::Database, message.to_string(), err),
    }
}
