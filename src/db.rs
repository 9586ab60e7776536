//! Database connection pool and migration management.

use sqlx::{Pool, Postgres};

/// Type alias for the PostgreSQL connection pool shared by all handlers.
pub type DbPool = Pool<Postgres>;

/// Upper bound on concurrent database connections.
///
/// The workload is short per-request round trips, so a small pool is
/// plenty; connections are created lazily and reused across requests.
const MAX_CONNECTIONS: u32 = 5;

/// Create the PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if the connection string is invalid, the server is
/// unreachable, or authentication fails.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Applied migrations are tracked in the `_sqlx_migrations` table, so each
/// file runs exactly once. This also installs the job-reservation
/// procedure the poll endpoint calls.
///
/// # Errors
///
/// Returns an error if a migration file is unreadable, contains invalid
/// SQL, or fails to execute.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro embeds the migrations directory at compile time
    sqlx::migrate!("./migrations").run(pool).await
}
