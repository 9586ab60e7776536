//! Agent-facing print job handlers.
//!
//! Both routes sit behind the bearer-auth middleware, which injects the
//! [`AgentContext`] and fires the last-seen touch.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::agent_auth::AgentContext,
    models::print_agent::{JobStatusRequest, PrintJob},
    state::AppState,
};

/// Poll for print work.
///
/// # Endpoint
///
/// `GET /api/print/jobs/poll`
///
/// # Response
///
/// Always 200 with `{"jobs": [...]}`. The atomic claim happens inside
/// the `reserve_print_job` database function; this handler treats the
/// result as an opaque row set. A reservation failure is logged and
/// answered with an empty list instead of an error, so agents keep their
/// polling loop running through transient backend trouble.
pub async fn poll(
    State(state): State<AppState>,
    Extension(agent): Extension<AgentContext>,
) -> Json<serde_json::Value> {
    let reservation = sqlx::query_as::<_, PrintJob>("SELECT * FROM reserve_print_job($1, $2)")
        .bind(agent.company_id)
        .bind(agent.agent_id)
        .fetch_all(&state.pool)
        .await;

    let jobs = match reservation {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::error!("reserve_print_job failed for agent {}: {e}", agent.agent_id);
            Vec::new()
        }
    };

    Json(json!({ "jobs": jobs }))
}

/// Report the outcome of a claimed job.
///
/// # Endpoint
///
/// `POST /api/print/jobs/{id}/status`
///
/// # Request Body
///
/// ```json
/// { "status": "done" }
/// { "status": "failed", "error": "printer offline" }
/// ```
///
/// # Response
///
/// - **200**: `{"ok": true}`
/// - **400**: status is neither "done" nor "failed"
/// - **403**: job belongs to another company
/// - **404**: unknown job
///
/// A completed job with an attached order also stamps the order's
/// `printed_at`; that write is best-effort and never fails the report.
pub async fn report_status(
    State(state): State<AppState>,
    Extension(agent): Extension<AgentContext>,
    Path(job_id): Path<Uuid>,
    Json(request): Json<JobStatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !matches!(request.status.as_str(), "done" | "failed") {
        return Err(AppError::InvalidRequest("invalid status".to_string()));
    }

    let job = sqlx::query_as::<_, PrintJob>(
        r#"
        SELECT id, company_id, order_id, status, payload, processed_by, processed_at, error, created_at
        FROM print_jobs
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("not_found"))?;

    if job.company_id != agent.company_id {
        return Err(AppError::Forbidden);
    }

    sqlx::query(
        r#"
        UPDATE print_jobs
        SET status = $1, error = $2, processed_at = NOW(), processed_by = $3
        WHERE id = $4
        "#,
    )
    .bind(&request.status)
    .bind(&request.error)
    .bind(agent.agent_id)
    .bind(job_id)
    .execute(&state.pool)
    .await?;

    if request.status == "done" {
        if let Some(order_id) = job.order_id {
            let stamped = sqlx::query("UPDATE orders SET printed_at = NOW() WHERE id = $1")
                .bind(order_id)
                .execute(&state.pool)
                .await;

            if let Err(e) = stamped {
                tracing::debug!("printed_at stamp failed for order {order_id}: {e}");
            }
        }
    }

    Ok(Json(json!({ "ok": true })))
}
