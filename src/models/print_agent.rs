//! Print-fleet models: agents, download tokens and jobs.
//!
//! An agent authenticates with a bearer API key. Only a bcrypt hash and an
//! 8-character prefix are stored; the prefix is the queryable part, the
//! hash is what actually authenticates. The plaintext key exists in a
//! response body exactly once, at creation or rotation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered desktop printing client.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PrintAgent {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,

    /// bcrypt hash of the full API key (never queryable by raw key).
    pub api_key_hash: String,

    /// First 8 hex characters of the key, used as a lookup pre-filter.
    pub api_key_prefix: String,

    pub is_active: bool,

    /// Best-effort liveness marker, touched on every authenticated poll.
    pub last_seen: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Request body for registering a new agent.
#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    #[serde(default)]
    pub name: String,
}

/// Public view of an agent, stripped of credential material.
#[derive(Debug, Serialize)]
pub struct AgentSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<PrintAgent> for AgentSummary {
    fn from(agent: PrintAgent) -> Self {
        Self {
            id: agent.id,
            name: agent.name,
            created_at: agent.created_at,
        }
    }
}

/// Response for agent creation.
///
/// `api_key` is the plaintext credential and is shown only here; the
/// server keeps just the hash and prefix.
#[derive(Debug, Serialize)]
pub struct CreateAgentResponse {
    pub agent: AgentSummary,
    pub api_key: String,
}

/// A short-lived single-use download credential row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DownloadToken {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub token_hash: String,
    pub token_prefix: String,

    /// SHA-256 of the API key the token was issued against (audit only).
    pub api_key_fingerprint: String,

    pub created_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Response for download-token generation.
#[derive(Debug, Serialize)]
pub struct GenerateTokenResponse {
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Query parameters for the download endpoint.
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub token: Option<String>,
    pub platform: Option<String>,
}

/// A unit of print work as returned by the reservation procedure.
///
/// The reservation itself happens inside the database function; this
/// layer treats the rows as opaque work descriptions and forwards them
/// to the agent as-is.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PrintJob {
    pub id: Uuid,
    pub company_id: Uuid,
    pub order_id: Option<Uuid>,
    pub status: String,
    pub payload: Option<serde_json::Value>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for an agent reporting a job outcome.
#[derive(Debug, Deserialize)]
pub struct JobStatusRequest {
    #[serde(default)]
    pub status: String,

    pub error: Option<String>,
}
