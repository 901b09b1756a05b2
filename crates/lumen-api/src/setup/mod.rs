//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from
//! main.rs for better organization and testability.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::services::upload_session::{
    spawn_session_sweeper, UploadRateLimiter, UploadSessionStore,
};
use crate::state::{AppState, DbState, UploadState};
use anyhow::Result;
use lumen_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    init_tracing();

    tracing::info!(environment = %config.environment(), "Configuration loaded");

    // Setup database
    let pool = database::setup_database(&config).await?;

    // Setup storage
    let storage = storage::setup_storage(&config).await?;

    let sessions = UploadSessionStore::new();
    spawn_session_sweeper(sessions.clone());

    let state = Arc::new(AppState {
        db: DbState::new(pool),
        storage,
        uploads: UploadState {
            sessions,
            rate_limiter: UploadRateLimiter::new(
                config.presign_rate_limit(),
                config.presign_rate_window_secs(),
            ),
        },
        config: config.clone(),
    });

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
