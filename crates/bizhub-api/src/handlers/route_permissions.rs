//! Route grant handlers (company owner only).

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;
use validator::Validate;

use crate::dto::request::{GrantRouteRequest, RouteQuery};
use crate::dto::response::{ApiResponse, MessageResponse, RoleResponse, RouteGrantResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/route-permissions?route=/dashboard
pub async fn list_route_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RouteQuery>,
) -> Result<Json<ApiResponse<Vec<RoleResponse>>>, ApiError> {
    query.validate()?;
    let roles = state
        .admin
        .roles_for_route(&auth.principal, &query.route)
        .await?;
    Ok(Json(ApiResponse::ok(
        roles.into_iter().map(RoleResponse::from).collect(),
    )))
}

/// POST /api/route-permissions
pub async fn grant_route(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<GrantRouteRequest>,
) -> Result<Json<ApiResponse<RouteGrantResponse>>, ApiError> {
    req.validate()?;
    let grant = state
        .admin
        .grant_route(&auth.principal, &req.route, req.role_id, &auth.client)
        .await?;
    Ok(Json(ApiResponse::ok(grant.into())))
}

/// DELETE /api/route-permissions/{role_id}?route=/dashboard
pub async fn revoke_route(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(role_id): Path<Uuid>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    query.validate()?;
    state
        .admin
        .revoke_route(&auth.principal, &query.route, role_id, &auth.client)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Route revoked"))))
}
