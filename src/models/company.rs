//! Tenant and membership models.
//!
//! Every piece of persistent data in the system is scoped to exactly one
//! company. A membership row binds a user to a company with a role
//! (owner/admin/staff); the role decides which endpoints are reachable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-to-company binding as stored in `company_users`.
///
/// Inactive memberships are treated the same as missing ones everywhere:
/// suspending a member revokes access without deleting history.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Membership {
    pub id: Uuid,

    /// Role within the company. Compared lowercased against per-route
    /// allow-lists; stored free-form ("owner", "admin", "staff").
    pub role: String,

    pub is_active: bool,
}

/// One row of the workspace picker: a company the caller belongs to.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WorkspaceEntry {
    pub id: Uuid,
    pub name: String,
    pub role: String,
}

/// Request body for selecting the active workspace.
#[derive(Debug, Deserialize)]
pub struct SelectWorkspaceRequest {
    pub company_id: Option<Uuid>,
}
