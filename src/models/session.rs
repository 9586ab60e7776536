//! Synced auth-session models.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// A session row as needed by the access gate.
///
/// The full table also stores the hashed refresh token and creation time;
/// lookups only ever need the identity and the expiry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Request body for `POST /api/auth/sync-session`.
///
/// Both tokens come from the auth platform; the access token is an
/// HMAC-signed value this server can verify with the shared secret.
#[derive(Debug, Deserialize)]
pub struct SyncSessionRequest {
    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: String,
}
