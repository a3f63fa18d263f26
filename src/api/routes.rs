//! Shared application state and router assembly.
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api::handlers;
use crate::config::Config;
use crate::session::SessionManager;

pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionManager>,
}

/// Build the service router. Kept separate from `main` so tests can drive the
/// app with a stub session factory.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let max_upload = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/warmup", get(handlers::warmup).post(handlers::warmup))
        .route("/remove-background", post(handlers::remove_background))
        .route("/api-info", get(handlers::api_info))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &str) -> CorsLayer {
    if origins.trim() == "*" {
        return CorsLayer::permissive();
    }
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}
