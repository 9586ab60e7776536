//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Performs business logic (database queries, validation)
//! 3. Returns HTTP response (JSON, status code)
//!
//! Tenant-scoped handlers call the company-access gate before anything
//! else; agent-facing handlers run behind the bearer middleware or verify
//! the bearer key inline.

/// Session sync and sign-out
pub mod auth;
/// Billing status and overage toggling
pub mod billing;
/// Service health check
pub mod health;
/// Order listing and aggregations
pub mod orders;
/// Print-agent registration, rotation and download tokens
pub mod print_agents;
/// Agent job polling and status reports
pub mod print_jobs;
/// Printer registry
pub mod printers;
/// WhatsApp thread and message viewing
pub mod whatsapp;
/// Workspace selection
pub mod workspace;
