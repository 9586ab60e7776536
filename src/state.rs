//! Shared application state.

use crate::{config::Config, db::DbPool};

/// State handed to every handler via Axum's `State` extractor.
///
/// Cloning is cheap: the pool is internally reference-counted and the
/// config is a small owned struct.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
}
