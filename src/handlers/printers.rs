//! Printer registry handlers.
//!
//! The GET side serves polling agents (bearer key, verified inline since
//! the POST side of the same route uses the session flow); the POST side
//! lets any active member register a printer for their company.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::agent_auth::bearer_token,
    models::printer::{CreatePrinterRequest, Printer},
    services::{agent_service, session_service, workspace_service},
    state::AppState,
};

/// List a company's active printers for a polling agent.
///
/// # Endpoint
///
/// `GET /api/print/companies/{company_id}/printers`
///
/// # Authentication
///
/// `Authorization: Bearer <api-key>`; 401 on missing/invalid key, 403
/// when the key belongs to an agent of a different company.
pub async fn lookup(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let agent = agent_service::verify_agent_by_api_key(&state.pool, token)
        .await
        .ok_or(AppError::Unauthorized)?;

    if agent.company_id != company_id {
        return Err(AppError::Forbidden);
    }

    let printers = sqlx::query_as::<_, Printer>(
        r#"
        SELECT id, company_id, name, kind, format, auto_print, interval_seconds,
               is_active, config, created_at
        FROM printers
        WHERE company_id = $1 AND is_active = TRUE
        ORDER BY name
        "#,
    )
    .bind(company_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "printers": printers })))
}

/// Register a printer for a company.
///
/// # Endpoint
///
/// `POST /api/print/companies/{company_id}/printers`
///
/// # Authentication
///
/// Session cookie plus an active membership in the target company; any
/// role may register printers.
pub async fn register(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<CreatePrinterRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id =
        session_service::resolve_user(&state.pool, &state.config.session_secret, &headers)
            .await
            .ok_or(AppError::Unauthorized)?;

    if !workspace_service::has_active_membership(&state.pool, company_id, user_id).await? {
        return Err(AppError::Forbidden);
    }

    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("name required".to_string()));
    }

    let printer = sqlx::query_as::<_, Printer>(
        r#"
        INSERT INTO printers
            (company_id, name, kind, format, auto_print, interval_seconds, is_active, config)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, company_id, name, kind, format, auto_print, interval_seconds,
                  is_active, config, created_at
        "#,
    )
    .bind(company_id)
    .bind(name)
    .bind(&request.kind)
    .bind(&request.format)
    .bind(request.auto_print)
    .bind(request.interval_seconds)
    .bind(request.is_active)
    .bind(&request.config)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({ "printer": printer })))
}
