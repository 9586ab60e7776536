//! WhatsApp conversation viewing handlers.
//!
//! The messaging pipeline writes threads and messages; this surface reads
//! them for the inbox screen and records per-user read markers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::whatsapp::{ThreadListParams, WhatsappMessage, WhatsappThread},
    services::workspace_service::require_company_access,
    state::AppState,
};

const INBOX_ROLES: &[&str] = &["owner", "admin", "staff"];

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// List conversation threads, most recently active first.
///
/// # Endpoint
///
/// `GET /api/whatsapp/threads?limit=50&q=maria`
///
/// `q` is matched case-insensitively against the phone number and the
/// profile name.
pub async fn threads(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ThreadListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let access = require_company_access(&state, &headers, Some(INBOX_ROLES)).await?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let search = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let threads = match search {
        Some(q) => {
            let pattern = format!("%{q}%");
            sqlx::query_as::<_, WhatsappThread>(
                r#"
                SELECT id, phone_e164, profile_name, last_message_at, last_message_preview, created_at
                FROM whatsapp_threads
                WHERE company_id = $1
                  AND (phone_e164 ILIKE $2 OR profile_name ILIKE $2)
                ORDER BY last_message_at DESC NULLS LAST
                LIMIT $3
                "#,
            )
            .bind(access.company_id)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&state.pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, WhatsappThread>(
                r#"
                SELECT id, phone_e164, profile_name, last_message_at, last_message_preview, created_at
                FROM whatsapp_threads
                WHERE company_id = $1
                ORDER BY last_message_at DESC NULLS LAST
                LIMIT $2
                "#,
            )
            .bind(access.company_id)
            .bind(limit)
            .fetch_all(&state.pool)
            .await?
        }
    };

    Ok(Json(json!({ "threads": threads })))
}

/// List a thread's messages in chronological order.
///
/// # Endpoint
///
/// `GET /api/whatsapp/threads/{thread_id}/messages`
///
/// Returns 404 "Thread not found" when the thread does not exist or
/// belongs to another company.
pub async fn messages(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let access = require_company_access(&state, &headers, Some(INBOX_ROLES)).await?;

    // The ownership check doubles as the existence check
    let thread: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM whatsapp_threads WHERE id = $1 AND company_id = $2")
            .bind(thread_id)
            .bind(access.company_id)
            .fetch_optional(&state.pool)
            .await?;

    if thread.is_none() {
        return Err(AppError::NotFound("Thread not found"));
    }

    let messages = sqlx::query_as::<_, WhatsappMessage>(
        r#"
        SELECT id, direction, provider, from_addr, to_addr, body, status, created_at
        FROM whatsapp_messages
        WHERE thread_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(thread_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "messages": messages })))
}

/// Mark a thread as read for the calling user, up to now.
///
/// # Endpoint
///
/// `POST /api/whatsapp/threads/{thread_id}/read`
///
/// Upserts the read marker so repeated calls just move `last_read_at`
/// forward.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let access = require_company_access(&state, &headers, Some(INBOX_ROLES)).await?;

    sqlx::query(
        r#"
        INSERT INTO whatsapp_thread_reads (company_id, user_id, thread_id, last_read_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (company_id, user_id, thread_id)
        DO UPDATE SET last_read_at = NOW()
        "#,
    )
    .bind(access.company_id)
    .bind(access.user_id)
    .bind(thread_id)
    .execute(&state.pool)
    .await?;

    Ok(Json(json!({ "ok": true })))
}
