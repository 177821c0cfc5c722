//! Role and role-membership handlers (company owner only).

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;
use validator::Validate;

use crate::dto::request::{AssignRoleRequest, CreateRoleRequest};
use crate::dto::response::{AccountRoleResponse, ApiResponse, MessageResponse, RoleResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/roles
pub async fn list_roles(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<RoleResponse>>>, ApiError> {
    let roles = state.admin.list_roles(&auth.principal).await?;
    Ok(Json(ApiResponse::ok(
        roles.into_iter().map(RoleResponse::from).collect(),
    )))
}

/// POST /api/roles
pub async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateRoleRequest>,
) -> Result<Json<ApiResponse<RoleResponse>>, ApiError> {
    req.validate()?;
    let role = state
        .admin
        .create_role(&auth.principal, &req.name, req.color, &auth.client)
        .await?;
    Ok(Json(ApiResponse::ok(role.into())))
}

/// DELETE /api/roles/{role_id}
pub async fn delete_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(role_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .admin
        .delete_role(&auth.principal, role_id, &auth.client)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Role deleted"))))
}

/// GET /api/users/{account_id}/roles
pub async fn list_account_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RoleResponse>>>, ApiError> {
    let roles = state.admin.account_roles(&auth.principal, account_id).await?;
    Ok(Json(ApiResponse::ok(
        roles.into_iter().map(RoleResponse::from).collect(),
    )))
}

/// POST /api/users/{account_id}/roles
pub async fn assign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<ApiResponse<AccountRoleResponse>>, ApiError> {
    let grant = state
        .admin
        .assign_role(&auth.principal, account_id, req.role_id, &auth.client)
        .await?;
    Ok(Json(ApiResponse::ok(grant.into())))
}

/// DELETE /api/users/{account_id}/roles/{role_id}
pub async fn remove_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((account_id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .admin
        .remove_role(&auth.principal, account_id, role_id, &auth.client)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Role removed"))))
}
