//! API route configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        // Anime metadata
        .route("/anime", get(handlers::get_anime))

        // Releases
        .route("/release", post(handlers::release_webhook))
        .route("/latest", get(handlers::get_latest))
        .route("/latest/pre", get(handlers::get_latest_pre))
        .route("/latest/manifest", get(handlers::get_manifest))

        // Image proxy
        .route("/image", get(handlers::proxy_image))

        // AniList OAuth
        .route("/auth", get(handlers::auth))
        .route("/callback", get(handlers::callback));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .with_state(state)
}
