//! API route handlers.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{OriginalUri, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use nime_core::constants::{EVENT_HEADER, PING_EVENT, SIGNATURE_HEADER};
use nime_core::error::NimeError;
use nime_core::types::{CacheEnvelope, ReleaseRecord, Resolved};
use nime_crypto::check_signature;

use crate::dto::*;
use crate::error::ApiError;
use crate::oauth::{app_callback, OAuthError};
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Fallback for unknown paths.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("'{}' not found", uri.path()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANIME
// ═══════════════════════════════════════════════════════════════════════════════

/// GET /api/anime?anime={id}
pub async fn get_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnimeQuery>,
) -> Result<Json<Resolved<Value>>> {
    let anime_id = query
        .anime
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Anime ID not provided"))?;

    match state.anime.resolve(anime_id).await {
        Ok(resolved) => Ok(Json(resolved)),
        Err(NimeError::ValidationError(message)) => Err(ApiError::bad_request(message)),
        Err(e) => {
            error!(anime_id, error = %e, "Error fetching anime data");
            Err(ApiError::internal("Error fetching anime data"))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RELEASES
// ═══════════════════════════════════════════════════════════════════════════════

/// POST /api/release
///
/// GitHub release webhook. `ping` is acknowledged before any verification;
/// every other event needs a valid signature over the raw body.
pub async fn release_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let event = header_str(&headers, EVENT_HEADER);
    if event == Some(PING_EVENT) {
        debug!("Webhook ping");
        return Ok(Json(PongResponse { message: "pong" }).into_response());
    }

    let signature = header_str(&headers, SIGNATURE_HEADER).ok_or(NimeError::SignatureMissing)?;

    let Some(secret) = state.webhook_secret.as_ref() else {
        error!("Webhook delivery rejected: no webhook secret configured");
        return Err(NimeError::SignatureInvalid.into());
    };

    if let Err(reason) = check_signature(secret, signature, &body) {
        error!(event, %reason, "Signature is invalid.");
        return Err(NimeError::SignatureInvalid.into());
    }

    let report = state.releases.refresh().await.map_err(|e| {
        error!(event, error = %e, "Release sync failed");
        ApiError::internal("Failed to sync releases")
    })?;

    info!(event, complete = report.is_complete(), "Webhook delivery processed");
    Ok(Json(SyncResponse::from(&report)).into_response())
}

/// GET /api/latest (`?pre` for the prerelease channel)
pub async fn get_latest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<CacheEnvelope<ReleaseRecord>>> {
    Ok(Json(state.releases.latest(query.wants_prerelease()).await?))
}

/// GET /api/latest/pre
pub async fn get_latest_pre(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CacheEnvelope<ReleaseRecord>>> {
    Ok(Json(state.releases.latest(true).await?))
}

/// GET /api/latest/manifest (`?pre` for the prerelease channel)
pub async fn get_manifest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<Value>> {
    match state.releases.manifest(query.wants_prerelease()).await {
        Ok(manifest) => Ok(Json(manifest)),
        Err(e) if e.is_not_found() && !matches!(e, NimeError::UpstreamNotFound(_)) => {
            Err(e.into())
        }
        Err(e) => {
            warn!(error = %e, "Failed to download latest.json");
            Err(ApiError::bad_gateway("Failed to fetch latest.json"))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMAGE PROXY
// ═══════════════════════════════════════════════════════════════════════════════

/// GET /api/image?url={cdn url}
pub async fn proxy_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImageQuery>,
) -> Result<Response> {
    let url = query
        .url
        .ok_or_else(|| ApiError::bad_request("Missing 'url' query parameter"))?;

    if !url.starts_with(&state.config.image_cdn_prefix) {
        return Err(ApiError::bad_request("Invalid URL"));
    }

    let response = state
        .http
        .get(&url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| {
            warn!(url = %url, error = %e, "Image fetch failed");
            ApiError::internal("Failed to fetch image")
        })?;

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    let body = Body::from_stream(response.bytes_stream());

    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

// ═══════════════════════════════════════════════════════════════════════════════
// OAUTH
// ═══════════════════════════════════════════════════════════════════════════════

/// GET /api/auth
pub async fn auth(State(state): State<Arc<AppState>>) -> Result<Response> {
    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| ApiError::internal("OAuth is not configured"))?;

    let location = oauth.authorize_url().map_err(|e| {
        error!(error = %e, "Invalid AniList authorize URL");
        ApiError::internal("OAuth is not configured")
    })?;

    Ok(found(location.as_str()))
}

/// GET /api/callback?code={code}
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::bad_request("Anilist did not return a code please try again."))?;

    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| ApiError::internal("OAuth is not configured"))?;

    match oauth.exchange_code(&code).await {
        Ok(token) => Ok(found(&app_callback(&token))),
        Err(OAuthError::MissingToken) => Err(ApiError::bad_request(
            "Anilist did not return a token please try again.",
        )),
        Err(e) => {
            error!(error = %e, "AniList token exchange failed");
            Err(ApiError::bad_gateway("Couldn't exchange code for token"))
        }
    }
}

/// 302 redirect (`axum::response::Redirect::to` answers 303).
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
