//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only what
//! they need via Axum's `FromRef`, and to avoid a single god object.

use crate::services::upload_session::{UploadRateLimiter, UploadSessionStore};
use lumen_core::Config;
use lumen_db::{
    EventRepository, MediaRepository, ProjectRepository, ShareTokenRepository, UserRepository,
};
use lumen_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

// ----- Sub-state types -----

/// Database pool and all repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub media_repository: MediaRepository,
    pub share_token_repository: ShareTokenRepository,
    pub event_repository: EventRepository,
    pub project_repository: ProjectRepository,
    pub user_repository: UserRepository,
}

impl DbState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            media_repository: MediaRepository::new(pool.clone()),
            share_token_repository: ShareTokenRepository::new(pool.clone()),
            event_repository: EventRepository::new(pool.clone()),
            project_repository: ProjectRepository::new(pool.clone()),
            user_repository: UserRepository::new(pool.clone()),
            pool,
        }
    }
}

/// In-process upload bookkeeping: sessions awaiting confirmation and the
/// per-user presign rate limiter.
#[derive(Clone)]
pub struct UploadState {
    pub sessions: UploadSessionStore,
    pub rate_limiter: UploadRateLimiter,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub storage: Arc<dyn Storage>,
    pub uploads: UploadState,
    pub config: Config,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for UploadState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.uploads.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
