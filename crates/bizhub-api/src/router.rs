//! Route definitions for the BizHub HTTP API.
//!
//! All routes are organized by resource and mounted under `/api`.

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use bizhub_auth::permission::{LOGIN_ROUTE, REGISTER_ROUTE};
use bizhub_core::config::CorsConfig;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(role_routes())
        .merge(route_permission_routes())
        .merge(audit_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Auth endpoints. Registration and login are the only public routes.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(REGISTER_ROUTE, post(handlers::auth::register))
        .route(LOGIN_ROUTE, post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/routes", get(handlers::auth::routes))
        .route("/auth/access", get(handlers::auth::access))
}

/// Role and membership administration
fn role_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/roles",
            get(handlers::roles::list_roles).post(handlers::roles::create_role),
        )
        .route("/roles/{role_id}", delete(handlers::roles::delete_role))
        .route(
            "/users/{account_id}/roles",
            get(handlers::roles::list_account_roles).post(handlers::roles::assign_role),
        )
        .route(
            "/users/{account_id}/roles/{role_id}",
            delete(handlers::roles::remove_role),
        )
}

/// Route grant administration
fn route_permission_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/route-permissions",
            get(handlers::route_permissions::list_route_roles)
                .post(handlers::route_permissions::grant_route),
        )
        .route(
            "/route-permissions/{role_id}",
            delete(handlers::route_permissions::revoke_route),
        )
}

fn audit_routes() -> Router<AppState> {
    Router::new().route("/audit-logs", get(handlers::audit_logs::list_audit_logs))
}

fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/ready", get(handlers::health::ready))
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age_seconds))
}
