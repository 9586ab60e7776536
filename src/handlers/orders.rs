//! Order HTTP handlers.
//!
//! This module implements the order-related API endpoints:
//! - GET /api/orders/list - List recent orders with customer info
//! - GET /api/orders/status - Per-status count/revenue summary
//! - GET /api/orders/stats - Dashboard aggregates and 30-day series
//! - GET /api/orders/{id} - Single order with items (agent or session auth)

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::agent_auth::bearer_token,
    models::order::{DailyPoint, Order, OrderItem, OrderListParams, OrderListRow, StatusBucket},
    services::{agent_service, workspace_service::require_company_access},
    state::AppState,
};

/// Roles allowed on the order read surface.
const ORDER_ROLES: &[&str] = &["owner", "admin", "staff"];

/// Default and maximum page sizes for the order list.
const DEFAULT_LIMIT: i64 = 120;
const MAX_LIMIT: i64 = 300;

/// List recent orders for the active workspace, newest first.
///
/// # Endpoint
///
/// `GET /api/orders/list?limit=120&status=new`
///
/// `limit` is clamped to 300; `status=all` (or absent) disables the
/// status filter.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<OrderListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let access = require_company_access(&state, &headers, Some(ORDER_ROLES)).await?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "all");

    let orders = match status {
        Some(status) => {
            sqlx::query_as::<_, OrderListRow>(
                r#"
                SELECT o.id, o.status, o.total_cents, o.created_at,
                       c.name AS customer_name, c.phone AS customer_phone,
                       c.address AS customer_address
                FROM orders o
                LEFT JOIN customers c ON c.id = o.customer_id
                WHERE o.company_id = $1 AND o.status = $2
                ORDER BY o.created_at DESC
                LIMIT $3
                "#,
            )
            .bind(access.company_id)
            .bind(status)
            .bind(limit)
            .fetch_all(&state.pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, OrderListRow>(
                r#"
                SELECT o.id, o.status, o.total_cents, o.created_at,
                       c.name AS customer_name, c.phone AS customer_phone,
                       c.address AS customer_address
                FROM orders o
                LEFT JOIN customers c ON c.id = o.customer_id
                WHERE o.company_id = $1
                ORDER BY o.created_at DESC
                LIMIT $2
                "#,
            )
            .bind(access.company_id)
            .bind(limit)
            .fetch_all(&state.pool)
            .await?
        }
    };

    Ok(Json(json!({ "orders": orders })))
}

/// Per-status summary of the workspace's orders.
///
/// # Endpoint
///
/// `GET /api/orders/status`
///
/// # Response
///
/// ```json
/// {
///   "summary": {
///     "new": { "count": 4, "revenue_cents": 18200 },
///     "delivered": { "count": 12, "revenue_cents": 96050 }
///   }
/// }
/// ```
pub async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let access = require_company_access(&state, &headers, Some(ORDER_ROLES)).await?;

    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, total_cents FROM orders WHERE company_id = $1")
            .bind(access.company_id)
            .fetch_all(&state.pool)
            .await?;

    let mut summary: BTreeMap<String, StatusBucket> = BTreeMap::new();
    for (status, total_cents) in rows {
        let bucket = summary.entry(status).or_default();
        bucket.count += 1;
        bucket.revenue_cents += total_cents;
    }

    Ok(Json(json!({ "summary": summary })))
}

/// Dashboard aggregates: status counts, total revenue, and a daily series
/// covering the last 30 days (including empty days).
///
/// # Endpoint
///
/// `GET /api/orders/stats`
pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let access = require_company_access(&state, &headers, Some(ORDER_ROLES)).await?;

    let rows: Vec<(String, i64, DateTime<Utc>)> =
        sqlx::query_as("SELECT status, total_cents, created_at FROM orders WHERE company_id = $1")
            .bind(access.company_id)
            .fetch_all(&state.pool)
            .await?;

    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    let mut total_revenue_cents: i64 = 0;

    // Pre-seed one bucket per day so the series has no gaps
    let today = Utc::now().date_naive();
    let start = today - Days::new(29);
    let mut day_buckets: BTreeMap<NaiveDate, (i64, i64)> =
        (0..30u64).map(|i| (start + Days::new(i), (0, 0))).collect();

    for (status, total_cents, created_at) in rows {
        *counts.entry(status).or_default() += 1;
        total_revenue_cents += total_cents;

        if let Some((orders, revenue)) = day_buckets.get_mut(&created_at.date_naive()) {
            *orders += 1;
            *revenue += total_cents;
        }
    }

    let daily: Vec<DailyPoint> = day_buckets
        .into_iter()
        .map(|(date, (orders, revenue_cents))| DailyPoint {
            date: date.format("%Y-%m-%d").to_string(),
            orders,
            revenue_cents,
        })
        .collect();

    Ok(Json(json!({
        "counts": counts,
        "total_revenue_cents": total_revenue_cents,
        "daily": daily,
    })))
}

/// Fetch one order with its items.
///
/// # Endpoint
///
/// `GET /api/orders/{id}`
///
/// # Authentication
///
/// Print agents fetch order details for receipt printing with their
/// bearer key; the admin UI uses the normal session flow. A bearer header
/// that fails agent verification falls through to the session flow rather
/// than erroring, so a stale agent key behaves like no header at all.
pub async fn get(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(token) = bearer_token(&headers) {
        if let Some(agent) = agent_service::verify_agent_by_api_key(&state.pool, token).await {
            let order = fetch_order(&state, order_id, None).await?;
            if order.company_id != agent.company_id {
                return Err(AppError::Forbidden);
            }

            let items = fetch_items(&state, order_id).await?;
            return Ok(Json(json!({ "order": order, "items": items })));
        }
    }

    let access = require_company_access(&state, &headers, None).await?;
    let order = fetch_order(&state, order_id, Some(access.company_id)).await?;
    let items = fetch_items(&state, order_id).await?;

    Ok(Json(json!({ "order": order, "items": items })))
}

async fn fetch_order(
    state: &AppState,
    order_id: Uuid,
    company_id: Option<Uuid>,
) -> Result<Order, AppError> {
    let order = match company_id {
        Some(company_id) => {
            sqlx::query_as::<_, Order>(
                r#"
                SELECT id, company_id, customer_id, status, total_cents, printed_at, created_at
                FROM orders
                WHERE id = $1 AND company_id = $2
                "#,
            )
            .bind(order_id)
            .bind(company_id)
            .fetch_optional(&state.pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Order>(
                r#"
                SELECT id, company_id, customer_id, status, total_cents, printed_at, created_at
                FROM orders
                WHERE id = $1
                "#,
            )
            .bind(order_id)
            .fetch_optional(&state.pool)
            .await?
        }
    };

    order.ok_or(AppError::NotFound("not_found"))
}

async fn fetch_items(state: &AppState, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, product_name, quantity, unit_price_cents, line_total_cents, created_at
        FROM order_items
        WHERE order_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(order_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(items)
}
