//! Order data models and API response types.
//!
//! # Money Storage
//!
//! Amounts are stored as `i64` cents to avoid floating-point precision
//! issues. For example R$10.50 is stored as 1050 cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents an order record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Order {
    pub id: Uuid,

    /// Owning tenant. Queries always filter by this to keep companies
    /// isolated from each other.
    pub company_id: Uuid,

    pub customer_id: Option<Uuid>,

    /// Order lifecycle status ("new", "preparing", "delivering", ...).
    /// Free-form; the status aggregation groups on whatever values exist.
    pub status: String,

    /// Order total in cents.
    pub total_cents: i64,

    /// Set when a print agent reports the receipt as printed.
    pub printed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// A line item belonging to an order.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// One row of the order list: order fields plus the joined customer.
#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct OrderListRow {
    pub id: Uuid,
    pub status: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
}

/// Query parameters for `GET /api/orders/list`.
#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub limit: Option<i64>,

    /// Optional status filter; "all" (or absent) disables filtering.
    pub status: Option<String>,
}

/// Per-status aggregation bucket for the status summary endpoint.
#[derive(Debug, Default, Serialize)]
pub struct StatusBucket {
    pub count: i64,
    pub revenue_cents: i64,
}

/// One day of the 30-day revenue series.
#[derive(Debug, Serialize)]
pub struct DailyPoint {
    /// Day in `YYYY-MM-DD` (UTC).
    pub date: String,
    pub orders: i64,
    pub revenue_cents: i64,
}
