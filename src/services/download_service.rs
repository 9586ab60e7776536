//! Download-token issuance and consumption.
//!
//! A download token is the single-use credential embedded in the install
//! link an admin sends to the desktop machine. It is minted right after a
//! key rotation, stored as a bcrypt hash with an 8-character prefix, and
//! expires after a short TTL. Validation scans the few candidate rows
//! sharing the prefix and consumes the first hash match.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::print_agent::DownloadToken,
    services::agent_service::{hash_api_key, verify_api_key},
};

/// Random bytes behind each token (36 hex characters once encoded).
pub const DOWNLOAD_TOKEN_BYTES: usize = 18;

/// Length of the stored, queryable token prefix.
pub const TOKEN_PREFIX_LEN: usize = 8;

/// Default token lifetime in minutes.
pub const DEFAULT_TTL_MINUTES: i64 = 20;

/// A freshly minted token: the plaintext leaves the server once, in the
/// download URL handed back to the issuing admin.
#[derive(Debug)]
pub struct IssuedToken {
    pub token_plain: String,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Generate a fresh plaintext download token.
pub fn generate_token() -> String {
    hex::encode(rand::random::<[u8; DOWNLOAD_TOKEN_BYTES]>())
}

/// SHA-256 fingerprint of the API key a token was issued against.
///
/// Recorded for audit only; the key cannot be recovered from it.
pub fn api_key_fingerprint(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mint and persist a download token for an agent.
pub async fn create_download_token(
    pool: &DbPool,
    agent_id: Uuid,
    api_key_plain: &str,
    created_by: Option<Uuid>,
    ttl_minutes: i64,
) -> Result<IssuedToken, AppError> {
    let token_plain = generate_token();
    let token_hash = hash_api_key(&token_plain)?;
    let expires_at = Utc::now() + Duration::minutes(ttl_minutes);

    let token_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO agent_download_tokens
            (agent_id, token_hash, token_prefix, api_key_fingerprint, created_by, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(agent_id)
    .bind(&token_hash)
    .bind(&token_plain[..TOKEN_PREFIX_LEN])
    .bind(api_key_fingerprint(api_key_plain))
    .bind(created_by)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(IssuedToken {
        token_plain,
        token_id,
        expires_at,
    })
}

/// Validate a presented token and mark it used.
///
/// Candidates are the agent's unused, unexpired rows sharing the token
/// prefix; the full token must then match a stored bcrypt hash. Returns
/// the consumed row, or None for any miss (unknown, expired, already
/// used, or wrong token).
pub async fn validate_and_consume_token(
    pool: &DbPool,
    agent_id: Uuid,
    token_plain: &str,
) -> Result<Option<DownloadToken>, AppError> {
    if token_plain.len() < TOKEN_PREFIX_LEN {
        return Ok(None);
    }

    let candidates = sqlx::query_as::<_, DownloadToken>(
        r#"
        SELECT id, agent_id, token_hash, token_prefix, api_key_fingerprint,
               created_by, expires_at, used, used_at, created_at
        FROM agent_download_tokens
        WHERE agent_id = $1
          AND token_prefix = $2
          AND used = FALSE
          AND expires_at > NOW()
        ORDER BY created_at DESC
        LIMIT 10
        "#,
    )
    .bind(agent_id)
    .bind(&token_plain[..TOKEN_PREFIX_LEN])
    .fetch_all(pool)
    .await?;

    for token in candidates {
        if verify_api_key(token_plain, &token.token_hash) {
            sqlx::query(
                "UPDATE agent_download_tokens SET used = TRUE, used_at = NOW() WHERE id = $1",
            )
            .bind(token.id)
            .execute(pool)
            .await?;

            return Ok(Some(token));
        }
    }

    Ok(None)
}

/// Compose the download URL an admin forwards to the desktop machine.
pub fn build_download_url(
    base: &str,
    agent_id: Uuid,
    token_plain: &str,
    platform: &str,
) -> Result<String, AppError> {
    let mut url = Url::parse(base)
        .map_err(|e| AppError::Internal(format!("invalid download base URL {base:?}: {e}")))?;

    url.set_path(&format!("/api/print/agents/{agent_id}/download"));
    url.query_pairs_mut()
        .append_pair("token", token_plain)
        .append_pair("platform", platform);

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_36_hex_chars_and_unique() {
        let a = generate_token();
        let b = generate_token();

        assert_eq!(a.len(), 36);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_is_stable_64_hex() {
        let fp = api_key_fingerprint("some-key");
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, api_key_fingerprint("some-key"));
        assert_ne!(fp, api_key_fingerprint("other-key"));
    }

    #[test]
    fn download_url_has_the_published_shape() {
        let agent_id = Uuid::new_v4();
        let url =
            build_download_url("https://admin.example.com", agent_id, "tok123", "windows")
                .unwrap();

        assert_eq!(
            url,
            format!(
                "https://admin.example.com/api/print/agents/{agent_id}/download?token=tok123&platform=windows"
            )
        );
    }

    #[test]
    fn download_url_rejects_a_bad_base() {
        assert!(build_download_url("not a url", Uuid::new_v4(), "t", "linux").is_err());
    }
}
