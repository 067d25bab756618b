//! # NIME API Server
//!
//! HTTP edge API for the a.ni.me desktop client.
//!
//! ## Endpoints
//!
//! - `GET /api/anime?anime={id}` - Anime metadata, served cache-aside
//! - `POST /api/release` - GitHub release webhook (HMAC-SHA256 signed)
//! - `GET /api/latest` - Newest stable release (`?pre` for prerelease)
//! - `GET /api/latest/pre` - Newest prerelease
//! - `GET /api/latest/manifest` - Updater manifest of the newest release
//! - `GET /api/image?url={cdn url}` - Image proxy for the anime CDN
//! - `GET /api/auth`, `GET /api/callback` - AniList OAuth passthrough
//! - `GET /health` - Liveness
//!
//! ## Example
//!
//! ```rust,ignore
//! use nime_api::{ApiServer, AppState, NimeConfig};
//!
//! let config = NimeConfig::from_env();
//! let server = ApiServer::new(AppState::new(config)?);
//! server.run(([0, 0, 0, 0], 4000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod oauth;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, NimeConfig, DEFAULT_PORT};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server for NIME.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server around prepared state.
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates the router with all routes and middleware configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("NIME API server listening on {}", addr);

        axum::serve(listener, self.router()).await
    }
}
