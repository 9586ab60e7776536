//! Print-agent management handlers (admin-facing).
//!
//! This module implements the fleet-management endpoints:
//! - POST /api/print/agents - Register an agent, returning its key once
//! - POST /api/print/agents/{id}/generate-download-token - Rotate + mint link
//! - GET /api/print/agents/{id}/download - Redeem the link for the bundle

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::print_agent::{
        CreateAgentRequest, CreateAgentResponse, DownloadParams, GenerateTokenResponse, PrintAgent,
    },
    services::{
        agent_service::{self, generate_api_key, hash_api_key, key_prefix},
        download_service::{self, DEFAULT_TTL_MINUTES},
        workspace_service::require_company_access,
    },
    state::AppState,
};

/// Fleet management is an owner/admin concern.
const FLEET_ROLES: &[&str] = &["owner", "admin"];

/// TCP port the desktop agent binds locally, shipped in its config.
const AGENT_PORT: u16 = 4001;

/// Register a new print agent for the active workspace.
///
/// # Endpoint
///
/// `POST /api/print/agents`
///
/// # Request Body
///
/// ```json
/// { "name": "Loja1" }
/// ```
///
/// # Response (201 Created)
///
/// ```json
/// {
///   "agent": { "id": "...", "name": "Loja1", "created_at": "..." },
///   "api_key": "48 hex chars"
/// }
/// ```
///
/// The `api_key` is shown here and never again; only its bcrypt hash and
/// 8-character prefix are stored.
pub async fn create_agent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateAgentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let access = require_company_access(&state, &headers, Some(FLEET_ROLES)).await?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("name required".to_string()));
    }

    let api_key = generate_api_key();
    let hash = hash_api_key(&api_key)?;

    let agent = sqlx::query_as::<_, PrintAgent>(
        r#"
        INSERT INTO print_agents (company_id, name, api_key_hash, api_key_prefix, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING id, company_id, name, api_key_hash, api_key_prefix, is_active, last_seen, created_at
        "#,
    )
    .bind(access.company_id)
    .bind(name)
    .bind(&hash)
    .bind(key_prefix(&api_key))
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAgentResponse {
            agent: agent.into(),
            api_key,
        }),
    ))
}

/// Rotate an agent's key and mint a short-lived download link for it.
///
/// # Endpoint
///
/// `POST /api/print/agents/{id}/generate-download-token`
///
/// # Response (201 Created)
///
/// ```json
/// {
///   "download_url": ".../api/print/agents/{id}/download?token=...&platform=windows",
///   "expires_at": "..."
/// }
/// ```
///
/// Rotation happens first so a previously distributed key stops working
/// the moment a new install link exists. The admin only ever sees the
/// URL; the fresh key reaches the desktop through the download itself.
pub async fn generate_download_token(
    State(state): State<AppState>,
    Path(agent_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let access = require_company_access(&state, &headers, Some(FLEET_ROLES)).await?;

    let agent = fetch_agent(&state, agent_id).await?;
    if agent.company_id != access.company_id {
        return Err(AppError::Forbidden);
    }

    let api_key = agent_service::rotate_api_key(&state.pool, agent_id).await?;
    let issued = download_service::create_download_token(
        &state.pool,
        agent_id,
        &api_key,
        Some(access.user_id),
        DEFAULT_TTL_MINUTES,
    )
    .await?;

    let base = download_base_url(&state, &headers)?;
    let download_url =
        download_service::build_download_url(&base, agent_id, &issued.token_plain, "windows")?;

    Ok((
        StatusCode::CREATED,
        Json(GenerateTokenResponse {
            download_url,
            expires_at: issued.expires_at,
        }),
    ))
}

/// Redeem a download token for the agent's config bundle.
///
/// # Endpoint
///
/// `GET /api/print/agents/{id}/download?token=...&platform=windows`
///
/// # Response
///
/// - **200**: the config bundle, embedding a freshly rotated key
/// - **400**: `token` missing
/// - **403**: token unknown, expired, or already used (indistinguishable)
///
/// The token is consumed before anything else; the key in the bundle
/// comes from a rotation performed at redemption, so no recoverable key
/// material ever sits in storage waiting for this call.
pub async fn download(
    State(state): State<AppState>,
    Path(agent_id): Path<Uuid>,
    Query(params): Query<DownloadParams>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = params
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("token required".to_string()))?;
    let platform = params.platform.as_deref().unwrap_or("windows");

    let consumed = download_service::validate_and_consume_token(&state.pool, agent_id, token)
        .await?
        .ok_or(AppError::InvalidDownloadToken)?;

    let api_key = agent_service::rotate_api_key(&state.pool, agent_id).await?;
    let agent = fetch_agent(&state, agent_id).await?;

    tracing::info!(
        "download token {} redeemed for agent {} ({platform})",
        consumed.id,
        agent_id
    );

    let base = download_base_url(&state, &headers)?;

    Ok(Json(json!({
        "agent": { "id": agent.id, "name": agent.name, "company_id": agent.company_id },
        "platform": platform,
        "config": {
            "api_base": format!("{base}/api/print"),
            "agent_key": api_key,
            "agent_port": AGENT_PORT,
            "printer_config_path": "printers.json",
        },
    })))
}

async fn fetch_agent(state: &AppState, agent_id: Uuid) -> Result<PrintAgent, AppError> {
    sqlx::query_as::<_, PrintAgent>(
        r#"
        SELECT id, company_id, name, api_key_hash, api_key_prefix, is_active, last_seen, created_at
        FROM print_agents
        WHERE id = $1
        "#,
    )
    .bind(agent_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("agent_not_found"))
}

/// Base URL for download links: PUBLIC_URL when configured, otherwise
/// derived from the request's Host header.
fn download_base_url(state: &AppState, headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(base) = &state.config.public_url {
        return Ok(base.trim_end_matches('/').to_string());
    }

    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            AppError::Internal("PUBLIC_URL not configured and request has no Host header".into())
        })?;

    let scheme = if state.config.production { "https" } else { "http" };
    Ok(format!("{scheme}://{host}"))
}
