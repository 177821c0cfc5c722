//! Health check handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use bizhub_core::traits::cache::CacheProvider;

use crate::dto::response::{ApiResponse, HealthResponse, ReadinessResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// GET /api/health/ready
///
/// 503 when the database or cache cannot be reached.
pub async fn ready(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<ReadinessResponse>>) {
    let database = match &state.database {
        Some(pool) => match pool.ping().await {
            Ok(()) => "connected",
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                "unreachable"
            }
        },
        None => "memory",
    };

    let cache = match state.cache.health_check().await {
        Ok(true) => "connected",
        Ok(false) => "unreachable",
        Err(e) => {
            warn!(error = %e, "Cache health check failed");
            "unreachable"
        }
    };

    let ready = database != "unreachable" && cache != "unreachable";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::ok(ReadinessResponse {
            status: if ready { "ready" } else { "degraded" }.to_string(),
            database: database.to_string(),
            cache: cache.to_string(),
        })),
    )
}
