//! Workspace (active company) selection handlers.
//!
//! The active workspace lives in a signed httpOnly cookie. Selection
//! validates the caller's membership before setting it; everything else
//! just reads or clears the cookie.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde_json::json;

use crate::{
    error::AppError,
    models::company::{SelectWorkspaceRequest, WorkspaceEntry},
    services::{
        session_service::{self, WORKSPACE_COOKIE, WORKSPACE_COOKIE_MAX_AGE},
        workspace_service,
    },
    state::AppState,
};

/// Select the active workspace.
///
/// # Endpoint
///
/// `POST /api/workspace/select`
///
/// # Response
///
/// - **200**: `{"ok": true, "company_id": ...}` plus the signed cookie
/// - **400**: `company_id` missing
/// - **401**: not authenticated
/// - **403**: caller is not an active member of that company
pub async fn select(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SelectWorkspaceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let company_id = request
        .company_id
        .ok_or_else(|| AppError::InvalidRequest("company_id required".to_string()))?;

    let user_id =
        session_service::resolve_user(&state.pool, &state.config.session_secret, &headers)
            .await
            .ok_or(AppError::Unauthorized)?;

    if !workspace_service::has_active_membership(&state.pool, company_id, user_id).await? {
        return Err(AppError::Forbidden);
    }

    let signed =
        session_service::sign_value(&state.config.session_secret, &company_id.to_string());
    let cookie = session_service::build_cookie(
        WORKSPACE_COOKIE,
        &signed,
        WORKSPACE_COOKIE_MAX_AGE,
        state.config.production,
    );

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "ok": true, "company_id": company_id })),
    ))
}

/// List the companies the caller can switch to, with their role in each.
///
/// # Endpoint
///
/// `GET /api/workspace/list`
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id =
        session_service::resolve_user(&state.pool, &state.config.session_secret, &headers)
            .await
            .ok_or(AppError::Unauthorized)?;

    let companies = sqlx::query_as::<_, WorkspaceEntry>(
        r#"
        SELECT c.id, c.name, cu.role
        FROM company_users cu
        JOIN companies c ON c.id = cu.company_id
        WHERE cu.user_id = $1 AND cu.is_active = TRUE
        ORDER BY c.name
        "#,
    )
    .bind(user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "companies": companies })))
}

/// Clear the active workspace cookie.
///
/// # Endpoint
///
/// `POST /api/workspace/clear`
pub async fn clear(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = session_service::clear_cookie(WORKSPACE_COOKIE, state.config.production);

    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "ok": true })),
    )
}

/// Echo the currently selected workspace, or null.
///
/// # Endpoint
///
/// `GET /api/workspace/current`
pub async fn current(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let company_id =
        workspace_service::current_company_id(&state.config.session_secret, &headers);

    Json(json!({ "company_id": company_id }))
}
