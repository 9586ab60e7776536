//! Subscription, feature and usage-limit reads.
//!
//! Pure read-aggregation over the billing tables: the active subscription,
//! the enabled feature set (plan features plus addons), and monthly usage
//! snapshots. Nothing here increments a counter; `check_limit` with
//! increment 0 is the "where do we stand" snapshot the billing page shows.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::billing::{ActiveSubscription, LimitCheck},
};

/// Current month in `YYYY-MM` (UTC), the key usage rows are bucketed by.
pub fn current_year_month(now: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", now.year(), now.month())
}

/// Fetch the company's newest active subscription joined with its plan.
pub async fn get_active_subscription(
    pool: &DbPool,
    company_id: Uuid,
) -> Result<Option<ActiveSubscription>, AppError> {
    let subscription = sqlx::query_as::<_, ActiveSubscription>(
        r#"
        SELECT s.id AS subscription_id, s.plan_id, p.key AS plan_key,
               p.name AS plan_name, s.allow_overage
        FROM subscriptions s
        JOIN plans p ON p.id = s.plan_id
        WHERE s.company_id = $1 AND s.status = 'active'
        ORDER BY s.started_at DESC
        LIMIT 1
        "#,
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await?;

    Ok(subscription)
}

/// The feature keys enabled for a company: plan features plus any addons
/// bought on top. Empty without an active subscription.
pub async fn get_enabled_features(
    pool: &DbPool,
    company_id: Uuid,
) -> Result<BTreeSet<String>, AppError> {
    let Some(subscription) = get_active_subscription(pool, company_id).await? else {
        return Ok(BTreeSet::new());
    };

    let plan_features: Vec<String> =
        sqlx::query_scalar("SELECT feature_key FROM plan_features WHERE plan_id = $1")
            .bind(subscription.plan_id)
            .fetch_all(pool)
            .await?;

    let addons: Vec<String> =
        sqlx::query_scalar("SELECT feature_key FROM subscription_addons WHERE company_id = $1")
            .bind(company_id)
            .fetch_all(pool)
            .await?;

    Ok(plan_features.into_iter().chain(addons).collect())
}

/// The plan's monthly limit for one feature. None means no limit defined.
pub async fn get_plan_monthly_limit(
    pool: &DbPool,
    company_id: Uuid,
    feature_key: &str,
) -> Result<Option<i64>, AppError> {
    let Some(subscription) = get_active_subscription(pool, company_id).await? else {
        return Ok(None);
    };

    let limit: Option<Option<i64>> = sqlx::query_scalar(
        "SELECT limit_per_month FROM feature_limits WHERE plan_id = $1 AND feature_key = $2",
    )
    .bind(subscription.plan_id)
    .bind(feature_key)
    .fetch_optional(pool)
    .await?;

    Ok(limit.flatten())
}

/// This month's recorded usage for one feature. Missing row means 0.
pub async fn get_current_month_usage(
    pool: &DbPool,
    company_id: Uuid,
    feature_key: &str,
) -> Result<(String, i64), AppError> {
    let year_month = current_year_month(Utc::now());

    let used: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT used FROM usage_monthly
        WHERE company_id = $1 AND feature_key = $2 AND year_month = $3
        "#,
    )
    .bind(company_id)
    .bind(feature_key)
    .bind(&year_month)
    .fetch_optional(pool)
    .await?;

    Ok((year_month, used.unwrap_or(0)))
}

/// Limit policy, applied to already-fetched figures.
///
/// - No limit defined: always allowed.
/// - Projected usage (used + increment) within the limit: allowed.
/// - Over the limit: allowed only when the subscription opted into
///   overage; `will_overage_by` reports the excess either way.
pub fn evaluate_limit(
    feature_key: &str,
    year_month: String,
    used: i64,
    limit_per_month: Option<i64>,
    increment: i64,
    allow_overage: bool,
) -> LimitCheck {
    let (allowed, will_overage_by) = match limit_per_month {
        None => (true, 0),
        Some(limit) => {
            let projected = used + increment;
            if projected <= limit {
                (true, 0)
            } else {
                (allow_overage, projected - limit)
            }
        }
    };

    LimitCheck {
        allowed,
        feature_key: feature_key.to_string(),
        year_month,
        used,
        limit_per_month,
        will_overage_by,
        allow_overage,
    }
}

/// Check whether an action adding `increment` uses of a feature may
/// proceed, without mutating any counter.
pub async fn check_limit(
    pool: &DbPool,
    company_id: Uuid,
    feature_key: &str,
    increment: i64,
) -> Result<LimitCheck, AppError> {
    let subscription = get_active_subscription(pool, company_id).await?;
    let (year_month, used) = get_current_month_usage(pool, company_id, feature_key).await?;
    let limit = get_plan_monthly_limit(pool, company_id, feature_key).await?;

    let allow_overage = subscription.map(|s| s.allow_overage).unwrap_or(false);

    Ok(evaluate_limit(
        feature_key,
        year_month,
        used,
        limit,
        increment,
        allow_overage,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn check(used: i64, limit: Option<i64>, increment: i64, overage: bool) -> LimitCheck {
        evaluate_limit("whatsapp_messages", "2026-08".into(), used, limit, increment, overage)
    }

    #[test]
    fn no_limit_means_always_allowed() {
        let result = check(1_000_000, None, 50, false);
        assert!(result.allowed);
        assert_eq!(result.will_overage_by, 0);
        assert_eq!(result.limit_per_month, None);
    }

    #[test]
    fn within_limit_is_allowed() {
        let result = check(90, Some(100), 10, false);
        assert!(result.allowed);
        assert_eq!(result.will_overage_by, 0);
    }

    #[test]
    fn over_limit_blocks_without_overage_opt_in() {
        let result = check(95, Some(100), 10, false);
        assert!(!result.allowed);
        assert_eq!(result.will_overage_by, 5);
    }

    #[test]
    fn over_limit_passes_with_overage_opt_in() {
        let result = check(95, Some(100), 10, true);
        assert!(result.allowed);
        assert_eq!(result.will_overage_by, 5);
        assert!(result.allow_overage);
    }

    #[test]
    fn zero_increment_is_a_pure_snapshot() {
        // The billing page asks "where do we stand" without consuming
        // anything; at the limit exactly, that is still within.
        let result = check(100, Some(100), 0, false);
        assert!(result.allowed);
        assert_eq!(result.used, 100);
        assert_eq!(result.will_overage_by, 0);
    }

    #[test]
    fn year_month_formats_with_zero_padding() {
        let march = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(current_year_month(march), "2026-03");

        let december = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(current_year_month(december), "2025-12");
    }
}
