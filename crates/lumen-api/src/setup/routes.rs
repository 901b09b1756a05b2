//! Route configuration and setup.
//!
//! Token-authorized routes (validation, downloads) are public; everything
//! under the session-token identity goes through the auth middleware.

use crate::auth::{auth_middleware, AuthState};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use lumen_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Request bodies are JSON only; media bytes go directly to storage via
/// presigned URLs. The ceiling leaves room for a base64 video frame.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        user_repository: state.db.user_repository.clone(),
    });

    let public_routes = public_routes(state.clone());
    let protected_routes = protected_routes(state.clone()).layer(
        axum::middleware::from_fn_with_state(auth_state, auth_middleware),
    );

    let app = public_routes
        .merge(protected_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins().iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::openapi_spec()) }),
        )
        .route(
            "/api/validate/{token}",
            get(handlers::validate::get_validation_view).patch(handlers::validate::apply_decisions),
        )
        .route("/api/download/{token}", get(handlers::download::list_downloads))
        .route(
            "/api/download/{token}/zip",
            get(handlers::download::download_zip),
        )
        .with_state(state)
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/media/upload/sign", post(handlers::upload::sign_upload))
        .route(
            "/api/media/upload/confirm",
            post(handlers::upload::confirm_upload),
        )
        .route(
            "/api/media/{id}/versions",
            post(handlers::versions::sign_version).patch(handlers::versions::confirm_version),
        )
        .route(
            "/api/events/{id}/share",
            post(handlers::share::create_share_token)
                .get(handlers::share::list_share_tokens)
                .delete(handlers::share::delete_share_token),
        )
        .with_state(state)
}
