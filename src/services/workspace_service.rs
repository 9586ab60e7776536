//! Company-access gate.
//!
//! Every tenant-scoped handler starts by calling [`require_company_access`]
//! and short-circuits on failure. The gate resolves the active workspace
//! from the signed cookie, authenticates the caller, checks the membership
//! row, and optionally enforces a role allow-list. It performs no writes.

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::company::Membership,
    services::session_service::{self, WORKSPACE_COOKIE},
    state::AppState,
};

/// Request-scoped tenant context produced by the gate.
#[derive(Debug, Clone)]
pub struct CompanyAccess {
    pub company_id: Uuid,
    pub user_id: Uuid,

    /// Membership role, lowercased.
    pub role: String,
}

/// Resolve the active company id from the signed workspace cookie.
///
/// None when the cookie is absent, tampered with, or not a UUID.
pub fn current_company_id(secret: &str, headers: &HeaderMap) -> Option<Uuid> {
    let raw = session_service::cookie_value(headers, WORKSPACE_COOKIE)?;
    let value = session_service::verify_signed_value(secret, &raw)?;
    Uuid::parse_str(&value).ok()
}

/// Check for an active membership binding a user to a company.
pub async fn has_active_membership(
    pool: &DbPool,
    company_id: Uuid,
    user_id: Uuid,
) -> Result<bool, AppError> {
    let membership = fetch_membership(pool, company_id, user_id).await?;
    Ok(membership.is_some_and(|m| m.is_active))
}

async fn fetch_membership(
    pool: &DbPool,
    company_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Membership>, AppError> {
    let membership = sqlx::query_as::<_, Membership>(
        "SELECT id, role, is_active FROM company_users WHERE company_id = $1 AND user_id = $2",
    )
    .bind(company_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(membership)
}

/// Gate a request on workspace selection, authentication, membership and
/// (optionally) role.
///
/// # Failure Mapping
///
/// - No (valid) workspace cookie → 400 "No workspace selected"
/// - Caller not authenticated → 401 "Unauthorized"
/// - Membership missing or inactive → 403 "Forbidden"
/// - Role not in `allowed_roles` → 403 "Insufficient role"
pub async fn require_company_access(
    state: &AppState,
    headers: &HeaderMap,
    allowed_roles: Option<&[&str]>,
) -> Result<CompanyAccess, AppError> {
    let company_id = current_company_id(&state.config.session_secret, headers)
        .ok_or(AppError::NoWorkspace)?;

    let user_id =
        session_service::resolve_user(&state.pool, &state.config.session_secret, headers)
            .await
            .ok_or(AppError::Unauthorized)?;

    let membership = fetch_membership(&state.pool, company_id, user_id)
        .await?
        .filter(|m| m.is_active)
        .ok_or(AppError::Forbidden)?;

    let role = membership.role.to_lowercase();

    if let Some(allowed) = allowed_roles {
        if !allowed.iter().any(|r| r.eq_ignore_ascii_case(&role)) {
            return Err(AppError::InsufficientRole);
        }
    }

    Ok(CompanyAccess {
        company_id,
        user_id,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session_service::sign_value;
    use axum::http::header::COOKIE;

    const SECRET: &str = "test-secret";

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            format!("renthus_company_id={value}").parse().unwrap(),
        );
        headers
    }

    #[test]
    fn resolves_a_properly_signed_workspace_cookie() {
        let company_id = Uuid::new_v4();
        let headers = headers_with_cookie(&sign_value(SECRET, &company_id.to_string()));

        assert_eq!(current_company_id(SECRET, &headers), Some(company_id));
    }

    #[test]
    fn rejects_missing_unsigned_or_tampered_cookies() {
        let company_id = Uuid::new_v4();

        // Absent
        assert_eq!(current_company_id(SECRET, &HeaderMap::new()), None);

        // Raw id without a signature
        let headers = headers_with_cookie(&company_id.to_string());
        assert_eq!(current_company_id(SECRET, &headers), None);

        // Signed with a different secret
        let headers = headers_with_cookie(&sign_value("other", &company_id.to_string()));
        assert_eq!(current_company_id(SECRET, &headers), None);

        // Signed payload that is not a UUID
        let headers = headers_with_cookie(&sign_value(SECRET, "not-a-uuid"));
        assert_eq!(current_company_id(SECRET, &headers), None);
    }
}
