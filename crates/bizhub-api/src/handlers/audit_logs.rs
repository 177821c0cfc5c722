//! Audit log handler.

use axum::Json;
use axum::extract::{Query, State};
use validator::Validate;

use crate::dto::request::AuditLogQuery;
use crate::dto::response::{ApiResponse, AuditLogResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Route key guarding the audit log.
pub const AUDIT_LOGS_ROUTE: &str = "/audit-logs";

/// GET /api/audit-logs?limit=50
///
/// Newest first, scoped to the caller's business.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<ApiResponse<Vec<AuditLogResponse>>>, ApiError> {
    query.validate()?;
    state
        .gateway
        .authorize(&auth.principal, AUDIT_LOGS_ROUTE, &auth.client)
        .await?;

    let entries = state
        .audit_log
        .find_recent(auth.business_id, query.limit())
        .await?;
    Ok(Json(ApiResponse::ok(
        entries.into_iter().map(AuditLogResponse::from).collect(),
    )))
}
