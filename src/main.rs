//! Renthus Admin Server - Main Application Entry Point
//!
//! This is the administrative REST API for a beverage-delivery business.
//! It provides session sync, multi-tenant workspace selection, order and
//! WhatsApp inbox reads, billing/entitlement checks, and the management
//! and polling surface for desktop print agents.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: HMAC-signed session cookies for the admin UI,
//!   bcrypt-hashed bearer API keys for print agents
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;

use tracing_subscriber::EnvFilter;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let server_port = config.server_port;
    let state = AppState { pool, config };

    // Agent-facing job routes, gated by the bearer-key middleware
    let agent_routes = Router::new()
        .route("/api/print/jobs/poll", get(handlers::print_jobs::poll))
        .route(
            "/api/print/jobs/{id}/status",
            post(handlers::print_jobs::report_status),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::agent_auth::agent_auth,
        ));

    let app = Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        // Session sync
        .route("/api/auth/sync-session", post(handlers::auth::sync_session))
        .route("/api/auth/signout", post(handlers::auth::signout))
        // Workspace selection
        .route("/api/workspace/select", post(handlers::workspace::select))
        .route("/api/workspace/list", get(handlers::workspace::list))
        .route("/api/workspace/clear", post(handlers::workspace::clear))
        .route("/api/workspace/current", get(handlers::workspace::current))
        // Orders
        .route("/api/orders/list", get(handlers::orders::list))
        .route("/api/orders/status", get(handlers::orders::status))
        .route("/api/orders/stats", get(handlers::orders::stats))
        .route("/api/orders/{id}", get(handlers::orders::get))
        // WhatsApp inbox
        .route("/api/whatsapp/threads", get(handlers::whatsapp::threads))
        .route(
            "/api/whatsapp/threads/{thread_id}/messages",
            get(handlers::whatsapp::messages),
        )
        .route(
            "/api/whatsapp/threads/{thread_id}/read",
            post(handlers::whatsapp::mark_read),
        )
        // Billing
        .route("/api/billing/status", get(handlers::billing::status))
        .route(
            "/api/billing/allow-overage",
            post(handlers::billing::allow_overage),
        )
        // Print fleet management (admin side)
        .route("/api/print/agents", post(handlers::print_agents::create_agent))
        .route(
            "/api/print/agents/{id}/generate-download-token",
            post(handlers::print_agents::generate_download_token),
        )
        .route(
            "/api/print/agents/{id}/download",
            get(handlers::print_agents::download),
        )
        // Printer registry: agents read with a bearer key, members write
        // with their session, so auth is handled inside the handlers
        .route(
            "/api/print/companies/{company_id}/printers",
            get(handlers::printers::lookup).post(handlers::printers::register),
        )
        // Agent job routes carry their own middleware
        .merge(agent_routes)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share state with all handlers via State extraction
        .with_state(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
