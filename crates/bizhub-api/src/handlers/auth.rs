//! Auth handlers: register, login, logout, me, routes, access.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use validator::Validate;

use crate::dto::request::{LoginRequest, RegisterRequest, RouteQuery};
use crate::dto::response::{
    AccessResponse, ApiResponse, LoginResponse, MessageResponse, RoutesResponse, SessionResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, BearerToken, ClientInfo};
use crate::state::AppState;

/// POST /api/auth/create
pub async fn register(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ApiError> {
    req.validate()?;

    let registration = state
        .gateway
        .register(&req.business_name, &req.name, &req.email, &req.password, &client)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SessionResponse::new(
            registration.profile,
            registration.preferences,
        ))),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    req.validate()?;

    let result = state.gateway.login(&req.email, &req.password, &client).await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        token: result.token,
        expires_at: result.expires_at,
        session: SessionResponse::new(result.profile, result.preferences),
    })))
}

/// POST /api/auth/logout
///
/// Accepts any token this service signed, including expired ones.
pub async fn logout(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    BearerToken(token): BearerToken,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.gateway.logout_token(&token, &client).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Logged out successfully",
    ))))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    let profile = state.gateway.profile(&auth.principal).await?;
    let preferences = state.gateway.preferences(&auth.principal).await?;
    Ok(Json(ApiResponse::ok(SessionResponse::new(profile, preferences))))
}

/// GET /api/auth/routes
pub async fn routes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<RoutesResponse>>, ApiError> {
    let routes = state.gateway.accessible_routes(&auth.principal).await?;
    Ok(Json(ApiResponse::ok(RoutesResponse {
        routes: routes.into_iter().collect(),
    })))
}

/// GET /api/auth/access?route=/dashboard
///
/// 200 when the caller may reach `route`, 403 otherwise.
pub async fn access(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RouteQuery>,
) -> Result<Json<ApiResponse<AccessResponse>>, ApiError> {
    query.validate()?;
    let source = state
        .gateway
        .authorize(&auth.principal, &query.route, &auth.client)
        .await?;
    Ok(Json(ApiResponse::ok(AccessResponse {
        route: query.route,
        allowed: true,
        source,
    })))
}
