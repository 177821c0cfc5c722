//! # bizhub-database
//!
//! PostgreSQL connection management, the store traits consumed by the
//! authentication core, and two implementations of each: `sqlx`-backed
//! repositories and in-memory stores for single-node development and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use memory::{MemoryAuditSink, MemoryDirectory, MemorySessionStore};
pub use repositories::{
    AccessRepository, AccessStore, AccountRepository, AccountStore, AuditLogRepository, AuditQuery,
    AuditSink, SessionRepository, SessionStore,
};
