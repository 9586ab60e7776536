//! Session sync and sign-out handlers.
//!
//! The browser authenticates against the auth platform and hands the
//! resulting token pair to `sync-session`, which verifies the signed
//! access token, mirrors the session server-side, and moves the token
//! into an httpOnly cookie.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use chrono::Utc;
use serde_json::json;

use crate::{
    error::AppError,
    models::session::SyncSessionRequest,
    services::session_service::{self, SESSION_COOKIE, WORKSPACE_COOKIE},
    state::AppState,
};

/// Sync an externally issued session into this server.
///
/// # Endpoint
///
/// `POST /api/auth/sync-session`
///
/// # Request Body
///
/// ```json
/// {
///   "access_token": "user.expiry.signature",
///   "refresh_token": "..."
/// }
/// ```
///
/// # Response
///
/// - **200**: `{"ok": true}` plus a Set-Cookie for the session
/// - **400**: missing tokens, or a token that fails signature/expiry checks
pub async fn sync_session(
    State(state): State<AppState>,
    Json(request): Json<SyncSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.access_token.is_empty() || request.refresh_token.is_empty() {
        return Err(AppError::InvalidRequest(
            "access_token and refresh_token are required".to_string(),
        ));
    }

    let (user_id, expires_at) = session_service::verify_access_token(
        &state.config.session_secret,
        &request.access_token,
        Utc::now(),
    )
    .ok_or_else(|| AppError::InvalidRequest("Invalid session token".to_string()))?;

    // Mirror the identity locally so memberships and sessions can
    // reference it
    sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .execute(&state.pool)
        .await?;

    session_service::upsert_session(
        &state.pool,
        &request.access_token,
        &request.refresh_token,
        user_id,
        expires_at,
    )
    .await?;

    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    let cookie = session_service::build_cookie(
        SESSION_COOKIE,
        &request.access_token,
        max_age,
        state.config.production,
    );

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "ok": true })),
    ))
}

/// Sign out: drop the server-side session and clear both cookies.
///
/// # Endpoint
///
/// `POST /api/auth/signout`
///
/// The session-row delete is best-effort; cookie clearing alone already
/// ends the browser session, so a failure is only logged.
pub async fn signout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = session_service::cookie_value(&headers, SESSION_COOKIE) {
        if let Err(e) = session_service::delete_session(&state.pool, &token).await {
            tracing::warn!("server-side session delete failed: {e}");
        }
    }

    let secure = state.config.production;

    Ok((
        AppendHeaders([
            (SET_COOKIE, session_service::clear_cookie(SESSION_COOKIE, secure)),
            (SET_COOKIE, session_service::clear_cookie(WORKSPACE_COOKIE, secure)),
        ]),
        Json(json!({ "ok": true })),
    ))
}
