//! Billing status and overage toggling handlers.

use axum::{Json, extract::State, http::HeaderMap};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::billing::{BillingStatusResponse, UsageSnapshot},
    services::{entitlement_service, workspace_service::require_company_access},
    state::AppState,
};

/// Billing is an owner/admin concern.
const BILLING_ROLES: &[&str] = &["owner", "admin"];

/// Usage metric surfaced on the billing page.
const USAGE_FEATURE: &str = "whatsapp_messages";

/// Snapshot of the workspace's subscription, features and usage.
///
/// # Endpoint
///
/// `GET /api/billing/status`
///
/// Pure read aggregation: nothing is incremented, cached or invalidated.
/// The usage check runs with increment 0 so it reports where the company
/// stands without consuming anything.
pub async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BillingStatusResponse>, AppError> {
    let access = require_company_access(&state, &headers, Some(BILLING_ROLES)).await?;

    let subscription =
        entitlement_service::get_active_subscription(&state.pool, access.company_id).await?;
    let features =
        entitlement_service::get_enabled_features(&state.pool, access.company_id).await?;
    let whatsapp_usage =
        entitlement_service::check_limit(&state.pool, access.company_id, USAGE_FEATURE, 0).await?;

    let enabled_features: Vec<String> = features.into_iter().collect();
    let enabled_features_count = enabled_features.len();

    Ok(Json(BillingStatusResponse {
        ok: true,
        company_id: access.company_id,
        subscription,
        enabled_features,
        enabled_features_count,
        usage: UsageSnapshot {
            whatsapp_messages: whatsapp_usage,
        },
    }))
}

/// Opt the active subscription into overage billing.
///
/// # Endpoint
///
/// `POST /api/billing/allow-overage`
///
/// Idempotent: enabling an already-enabled subscription succeeds without
/// touching the row. 400 "No active subscription" when there is none.
pub async fn allow_overage(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let access = require_company_access(&state, &headers, Some(BILLING_ROLES)).await?;

    let subscription: Option<(Uuid, bool)> = sqlx::query_as(
        r#"
        SELECT id, allow_overage FROM subscriptions
        WHERE company_id = $1 AND status = 'active'
        ORDER BY started_at DESC
        LIMIT 1
        "#,
    )
    .bind(access.company_id)
    .fetch_optional(&state.pool)
    .await?;

    let (subscription_id, already_enabled) = subscription
        .ok_or_else(|| AppError::InvalidRequest("No active subscription".to_string()))?;

    if !already_enabled {
        sqlx::query("UPDATE subscriptions SET allow_overage = TRUE WHERE id = $1")
            .bind(subscription_id)
            .execute(&state.pool)
            .await?;
    }

    Ok(Json(json!({
        "ok": true,
        "allow_overage": true,
        "subscription_id": subscription_id,
    })))
}
