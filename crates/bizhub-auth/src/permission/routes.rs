//! Route catalogue and route-string rules.

use bizhub_core::error::AppError;

/// The route every active account may reach, along with its sub-paths.
pub const PROFILE_ROUTE: &str = "/profile";

/// Every application route a company owner can reach.
pub const ROUTE_CATALOGUE: &[&str] = &[
    "/dashboard",
    "/profile",
    "/audit-logs",
    "/bank-accounts",
    "/business-admin",
];

pub const LOGIN_ROUTE: &str = "/auth/login";

/// Opens a new business together with its owner account.
pub const REGISTER_ROUTE: &str = "/auth/create";

/// Routes served without a bearer token. They can never be granted to a role.
pub const PUBLIC_ROUTES: &[&str] = &[LOGIN_ROUTE, REGISTER_ROUTE];

const MAX_ROUTE_LEN: usize = 255;

/// `/profile` and anything beneath it. Other routes match exactly.
pub fn is_profile_route(route: &str) -> bool {
    route == PROFILE_ROUTE
        || route
            .strip_prefix(PROFILE_ROUTE)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn is_public_route(route: &str) -> bool {
    PUBLIC_ROUTES.contains(&route)
}

/// Checks that a route string can be stored as a grant.
pub fn validate_route(route: &str) -> Result<(), AppError> {
    if !route.starts_with('/') {
        return Err(AppError::validation("Route must start with '/'"));
    }
    if route.len() > MAX_ROUTE_LEN {
        return Err(AppError::validation(format!(
            "Route must be at most {MAX_ROUTE_LEN} characters"
        )));
    }
    if route.chars().any(char::is_whitespace) {
        return Err(AppError::validation("Route must not contain whitespace"));
    }
    Ok(())
}
