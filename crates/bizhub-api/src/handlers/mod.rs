//! Request handlers, grouped by resource.

pub mod audit_logs;
pub mod auth;
pub mod health;
pub mod roles;
pub mod route_permissions;
