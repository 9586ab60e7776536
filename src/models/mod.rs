//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response types exchanged with clients.

/// Billing: subscriptions, entitlements and usage limits
pub mod billing;
/// Tenants and memberships
pub mod company;
/// Orders, items and customer joins
pub mod order;
/// Print fleet: agents, download tokens, jobs
pub mod print_agent;
/// Per-company printer registry
pub mod printer;
/// Synced auth sessions
pub mod session;
/// WhatsApp thread/message mirror
pub mod whatsapp;
