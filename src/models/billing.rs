//! Billing and entitlement models.

use serde::Serialize;
use uuid::Uuid;

/// The company's currently active subscription joined with its plan.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ActiveSubscription {
    pub subscription_id: Uuid,
    pub plan_id: Uuid,
    pub plan_key: String,
    pub plan_name: Option<String>,
    pub allow_overage: bool,
}

/// Result of checking one feature's monthly limit.
///
/// `allowed` answers "may the action that would add `increment` uses
/// proceed": true when no limit is defined or the projected usage stays
/// within it, otherwise true only if the subscription opted into overage.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LimitCheck {
    pub allowed: bool,
    pub feature_key: String,

    /// Month the usage figure belongs to, `YYYY-MM` (UTC).
    pub year_month: String,

    pub used: i64,

    /// None means unlimited / no limit defined for this plan.
    pub limit_per_month: Option<i64>,

    /// How far past the limit the projected usage lands. 0 when within.
    pub will_overage_by: i64,

    pub allow_overage: bool,
}

/// Usage section of the billing status snapshot.
#[derive(Debug, Serialize)]
pub struct UsageSnapshot {
    pub whatsapp_messages: LimitCheck,
}

/// Response body for `GET /api/billing/status`.
#[derive(Debug, Serialize)]
pub struct BillingStatusResponse {
    pub ok: bool,
    pub company_id: Uuid,

    /// None when the company has no active subscription.
    pub subscription: Option<ActiveSubscription>,

    pub enabled_features: Vec<String>,
    pub enabled_features_count: usize,
    pub usage: UsageSnapshot,
}
