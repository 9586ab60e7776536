//! Signed tokens, cookies and synced sessions.
//!
//! The auth platform issues access tokens of the form
//! `<user_id>.<expires_unix>.<signature>` where the signature is
//! HMAC-SHA256 over the first two fields with the shared `SESSION_SECRET`.
//! This server verifies them on sync, mirrors them into the `sessions`
//! table (hashed, never plaintext), and carries them in an httpOnly
//! cookie. The workspace cookie reuses the same signing scheme so a client
//! cannot point itself at a company it never selected.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{db::DbPool, models::session::Session};

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the synced access token.
pub const SESSION_COOKIE: &str = "renthus_session";

/// Cookie carrying the signed active-company id.
pub const WORKSPACE_COOKIE: &str = "renthus_company_id";

/// Workspace cookie lifetime: 30 days.
pub const WORKSPACE_COOKIE_MAX_AGE: i64 = 60 * 60 * 24 * 30;

/// Compute the hex HMAC-SHA256 signature of a value.
fn mac_hex(secret: &str, value: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key length is valid");
    mac.update(value.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Check a hex signature against a value. Constant-time on the MAC bytes.
fn mac_verify(secret: &str, value: &str, signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key length is valid");
    mac.update(value.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// Append a signature to a cookie value: `<value>.<signature>`.
pub fn sign_value(secret: &str, value: &str) -> String {
    format!("{}.{}", value, mac_hex(secret, value))
}

/// Verify and strip the signature from a cookie value.
///
/// Returns the inner value, or None for malformed or tampered input.
pub fn verify_signed_value(secret: &str, raw: &str) -> Option<String> {
    let (value, signature) = raw.rsplit_once('.')?;
    if mac_verify(secret, value, signature) {
        Some(value.to_string())
    } else {
        None
    }
}

/// Verify an access token and extract its identity and expiry.
///
/// Rejects tokens with a bad signature, a malformed payload, or an expiry
/// at or before `now`.
pub fn verify_access_token(
    secret: &str,
    token: &str,
    now: DateTime<Utc>,
) -> Option<(Uuid, DateTime<Utc>)> {
    let (payload, signature) = token.rsplit_once('.')?;
    if !mac_verify(secret, payload, signature) {
        return None;
    }

    let (user, expires) = payload.split_once('.')?;
    let user_id = Uuid::parse_str(user).ok()?;
    let expires_unix: i64 = expires.parse().ok()?;
    let expires_at = DateTime::from_timestamp(expires_unix, 0)?;

    if expires_at <= now {
        return None;
    }

    Some((user_id, expires_at))
}

/// Build a Set-Cookie header value with the attributes every cookie in
/// this app shares: Path=/, HttpOnly, SameSite=Lax, and Secure when
/// running in production.
pub fn build_cookie(name: &str, value: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build a Set-Cookie header value that removes a cookie (Max-Age=0).
pub fn clear_cookie(name: &str, secure: bool) -> String {
    build_cookie(name, "", 0, secure)
}

/// Extract a cookie value from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(axum::http::header::COOKIE) {
        let Ok(raw) = header.to_str() else {
            continue;
        };
        for part in raw.split(';') {
            if let Some(rest) = part.trim().strip_prefix(name) {
                if let Some(value) = rest.strip_prefix('=') {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// SHA-256 lookup hash for storing/finding a session by its token.
///
/// Fast hashing is fine here: the token is high-entropy and signed, so
/// the hash only needs to make the stored value non-recoverable.
pub fn token_lookup_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Insert or refresh the session row for a synced token pair.
pub async fn upsert_session(
    pool: &DbPool,
    access_token: &str,
    refresh_token: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sessions (token_hash, refresh_token_hash, user_id, expires_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (token_hash)
        DO UPDATE SET refresh_token_hash = $2, expires_at = $4
        "#,
    )
    .bind(token_lookup_hash(access_token))
    .bind(token_lookup_hash(refresh_token))
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up a live (non-expired) session by its access token.
pub async fn find_session(
    pool: &DbPool,
    access_token: &str,
) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        "SELECT user_id, expires_at FROM sessions WHERE token_hash = $1 AND expires_at > NOW()",
    )
    .bind(token_lookup_hash(access_token))
    .fetch_optional(pool)
    .await
}

/// Delete a session row (sign-out).
pub async fn delete_session(pool: &DbPool, access_token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(token_lookup_hash(access_token))
        .execute(pool)
        .await?;

    Ok(())
}

/// Resolve the authenticated user from the session cookie.
///
/// Any failure along the chain (no cookie, bad signature, expired token,
/// missing or expired session row, database error) resolves to None; the
/// caller turns that into a uniform 401.
pub async fn resolve_user(pool: &DbPool, secret: &str, headers: &HeaderMap) -> Option<Uuid> {
    let token = cookie_value(headers, SESSION_COOKIE)?;
    verify_access_token(secret, &token, Utc::now())?;

    match find_session(pool, &token).await {
        Ok(session) => session.map(|s| s.user_id),
        Err(e) => {
            tracing::warn!("session lookup failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use chrono::Duration;

    const SECRET: &str = "test-secret";

    fn make_token(secret: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> String {
        let payload = format!("{}.{}", user_id, expires_at.timestamp());
        format!("{}.{}", payload, mac_hex(secret, &payload))
    }

    #[test]
    fn signed_value_roundtrip() {
        let raw = sign_value(SECRET, "hello");
        assert_eq!(verify_signed_value(SECRET, &raw), Some("hello".to_string()));
    }

    #[test]
    fn tampered_value_is_rejected() {
        let raw = sign_value(SECRET, "company-a");
        let tampered = raw.replacen("company-a", "company-b", 1);
        assert_eq!(verify_signed_value(SECRET, &tampered), None);
        // Wrong secret fails too
        assert_eq!(verify_signed_value("other-secret", &raw), None);
        // Missing signature segment fails
        assert_eq!(verify_signed_value(SECRET, "no-dot-here"), None);
    }

    #[test]
    fn access_token_roundtrip() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);
        let token = make_token(SECRET, user_id, expires_at);

        let (resolved, resolved_expiry) =
            verify_access_token(SECRET, &token, Utc::now()).expect("token should verify");
        assert_eq!(resolved, user_id);
        assert_eq!(resolved_expiry.timestamp(), expires_at.timestamp());
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let token = make_token(SECRET, Uuid::new_v4(), Utc::now() - Duration::minutes(1));
        assert!(verify_access_token(SECRET, &token, Utc::now()).is_none());
    }

    #[test]
    fn forged_access_token_is_rejected() {
        let user_id = Uuid::new_v4();
        let expires = (Utc::now() + Duration::hours(1)).timestamp();
        let forged = format!("{user_id}.{expires}.deadbeef");
        assert!(verify_access_token(SECRET, &forged, Utc::now()).is_none());
        assert!(verify_access_token(SECRET, "garbage", Utc::now()).is_none());
    }

    #[test]
    fn cookie_value_finds_the_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "other=1; renthus_session=tok-123; renthus_company_id=abc"
                .parse()
                .unwrap(),
        );

        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE),
            Some("tok-123".to_string())
        );
        assert_eq!(
            cookie_value(&headers, WORKSPACE_COOKIE),
            Some("abc".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn build_cookie_sets_expected_attributes() {
        let cookie = build_cookie(WORKSPACE_COOKIE, "value", WORKSPACE_COOKIE_MAX_AGE, false);
        assert!(cookie.starts_with("renthus_company_id=value;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(!cookie.contains("Secure"));

        let secure = build_cookie(SESSION_COOKIE, "v", 60, true);
        assert!(secure.ends_with("; Secure"));

        let cleared = clear_cookie(WORKSPACE_COOKIE, false);
        assert!(cleared.contains("Max-Age=0"));
    }
}
