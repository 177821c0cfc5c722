//! Durable issued-token registry and its expiry sweep.

pub mod cleanup;
pub mod registry;

pub use cleanup::SessionCleanup;
pub use registry::SessionRegistry;
