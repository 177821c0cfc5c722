//! In-memory store implementations for single-node deployments and tests.

pub mod audit;
pub mod directory;
pub mod session;

pub use audit::MemoryAuditSink;
pub use directory::MemoryDirectory;
pub use session::MemorySessionStore;
