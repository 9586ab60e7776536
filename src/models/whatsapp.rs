//! WhatsApp conversation mirror models.
//!
//! Threads and messages are written by the messaging pipeline; this
//! surface only reads them and records per-user read markers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A conversation thread with one customer phone number.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct WhatsappThread {
    pub id: Uuid,
    pub phone_e164: String,
    pub profile_name: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_preview: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single inbound or outbound message within a thread.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct WhatsappMessage {
    pub id: Uuid,

    /// "inbound" or "outbound".
    pub direction: String,

    pub provider: Option<String>,
    pub from_addr: String,
    pub to_addr: String,
    pub body: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for the thread list.
#[derive(Debug, Deserialize)]
pub struct ThreadListParams {
    pub limit: Option<i64>,

    /// Free-text search matched against phone number and profile name.
    pub q: Option<String>,
}
