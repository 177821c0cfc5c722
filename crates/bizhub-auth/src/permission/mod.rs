//! Tenant-scoped route authorization.

pub mod resolver;
pub mod routes;

pub use resolver::{AccessDecision, DenialReason, GrantSource, PermissionResolver};
pub use routes::{
    LOGIN_ROUTE, PROFILE_ROUTE, PUBLIC_ROUTES, REGISTER_ROUTE, ROUTE_CATALOGUE, is_profile_route,
    is_public_route,
};
