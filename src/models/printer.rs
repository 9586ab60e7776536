//! Printer registry models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A printer registered for a company, as delivered to polling agents.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Printer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,

    /// Connection kind ("network", "usb", ...).
    pub kind: String,

    /// Output format ("receipt", "a4", ...).
    pub format: String,

    pub auto_print: bool,
    pub interval_seconds: i32,
    pub is_active: bool,

    /// Driver-specific settings, passed through to the agent untouched.
    pub config: serde_json::Value,

    pub created_at: DateTime<Utc>,
}

/// Request body for registering a printer.
#[derive(Debug, Deserialize)]
pub struct CreatePrinterRequest {
    pub name: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub auto_print: bool,

    #[serde(default)]
    pub interval_seconds: i32,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default = "default_config")]
    pub config: serde_json::Value,
}

fn default_kind() -> String {
    "network".to_string()
}

fn default_format() -> String {
    "receipt".to_string()
}

fn default_active() -> bool {
    true
}

fn default_config() -> serde_json::Value {
    serde_json::json!({})
}
