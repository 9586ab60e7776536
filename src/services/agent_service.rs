//! Print-agent credential lifecycle.
//!
//! Keys are 24 random bytes, hex-encoded to a 48-character plaintext that
//! the caller sees exactly once. Storage keeps a bcrypt hash plus the
//! first 8 characters as a lookup prefix; verification finds the candidate
//! row by prefix and then runs the slow, constant-time bcrypt comparison
//! against the full token. A failed lookup, prefix miss, and hash mismatch
//! are indistinguishable to the caller.

use uuid::Uuid;

use crate::{db::DbPool, error::AppError, models::print_agent::PrintAgent};

/// Random bytes behind each API key (48 hex characters once encoded).
pub const API_KEY_BYTES: usize = 24;

/// Length of the stored, queryable key prefix.
pub const KEY_PREFIX_LEN: usize = 8;

/// bcrypt work factor for API keys. The keys are high-entropy, so the
/// moderate cost keeps per-poll verification latency reasonable.
const BCRYPT_COST: u32 = 10;

/// Generate a fresh plaintext API key.
pub fn generate_api_key() -> String {
    hex::encode(rand::random::<[u8; API_KEY_BYTES]>())
}

/// The queryable prefix of a key. Callers must length-check first.
pub fn key_prefix(key: &str) -> &str {
    &key[..KEY_PREFIX_LEN]
}

/// Hash a plaintext key for storage.
pub fn hash_api_key(key: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(key, BCRYPT_COST)?)
}

/// Compare a plaintext key against a stored hash.
///
/// Malformed stored hashes count as a mismatch rather than an error, so a
/// corrupted row cannot be told apart from a wrong key.
pub fn verify_api_key(key: &str, hash: &str) -> bool {
    bcrypt::verify(key, hash).unwrap_or(false)
}

/// Authenticate a bearer API key against the agent registry.
///
/// Returns the agent on success, None otherwise. All failure modes
/// (too-short token, unknown prefix, inactive agent, hash mismatch, and
/// even a database error, which is logged) collapse into the same None so
/// nothing is leaked about which check failed.
pub async fn verify_agent_by_api_key(pool: &DbPool, api_key: &str) -> Option<PrintAgent> {
    if api_key.len() < KEY_PREFIX_LEN {
        return None;
    }

    let lookup = sqlx::query_as::<_, PrintAgent>(
        r#"
        SELECT id, company_id, name, api_key_hash, api_key_prefix, is_active, last_seen, created_at
        FROM print_agents
        WHERE api_key_prefix = $1 AND is_active = TRUE
        "#,
    )
    .bind(key_prefix(api_key))
    .fetch_optional(pool)
    .await;

    let agent = match lookup {
        Ok(agent) => agent?,
        Err(e) => {
            tracing::warn!("agent lookup failed: {e}");
            return None;
        }
    };

    if verify_api_key(api_key, &agent.api_key_hash) {
        Some(agent)
    } else {
        None
    }
}

/// Replace an agent's credential with a freshly generated one.
///
/// The previous plaintext irreversibly stops verifying since the stored
/// hash no longer matches it. Returns the new plaintext key, the only
/// time it is ever visible.
pub async fn rotate_api_key(pool: &DbPool, agent_id: Uuid) -> Result<String, AppError> {
    let api_key = generate_api_key();
    let hash = hash_api_key(&api_key)?;

    let updated = sqlx::query(
        r#"
        UPDATE print_agents
        SET api_key_hash = $1, api_key_prefix = $2, last_seen = NOW()
        WHERE id = $3
        "#,
    )
    .bind(&hash)
    .bind(key_prefix(&api_key))
    .bind(agent_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound("agent_not_found"));
    }

    Ok(api_key)
}

/// Touch the agent's last-seen marker on a detached task.
///
/// Liveness is best-effort observability: the poll response must not wait
/// on this write and a failure is only worth a debug line.
pub fn spawn_touch_last_seen(pool: DbPool, agent_id: Uuid) {
    tokio::spawn(async move {
        let result = sqlx::query("UPDATE print_agents SET last_seen = NOW() WHERE id = $1")
            .bind(agent_id)
            .execute(&pool)
            .await;

        if let Err(e) = result {
            tracing::debug!("last_seen update failed for agent {agent_id}: {e}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_48_hex_chars_and_unique() {
        let a = generate_api_key();
        let b = generate_api_key();

        assert_eq!(a.len(), 48);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn prefix_is_first_eight_chars() {
        let key = generate_api_key();
        assert_eq!(key_prefix(&key), &key[..8]);
        assert_eq!(key_prefix(&key).len(), KEY_PREFIX_LEN);
    }

    #[test]
    fn hash_verifies_only_the_original_key() {
        let key = generate_api_key();
        let hash = hash_api_key(&key).unwrap();

        assert!(verify_api_key(&key, &hash));
        assert!(!verify_api_key(&generate_api_key(), &hash));
    }

    #[test]
    fn rotation_invalidates_the_previous_plaintext() {
        // Rotation overwrites the stored hash with one derived from a new
        // key; the old plaintext must not verify against it.
        let old_key = generate_api_key();
        let new_key = generate_api_key();
        let new_hash = hash_api_key(&new_key).unwrap();

        assert!(verify_api_key(&new_key, &new_hash));
        assert!(!verify_api_key(&old_key, &new_hash));
    }

    #[test]
    fn malformed_stored_hash_is_a_mismatch_not_a_panic() {
        assert!(!verify_api_key("whatever", "not-a-bcrypt-hash"));
    }
}
