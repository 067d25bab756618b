//! Shared HTTP plumbing for upstream clients.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use nime_core::constants::USER_AGENT;
use nime_core::error::{NimeError, Result};

/// Builds a client with the service user agent and a request timeout.
pub fn build_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| NimeError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

/// Sends one request and decodes a JSON body.
///
/// 429 maps to [`NimeError::RateLimited`] so the retry policy can see it,
/// 404 to [`NimeError::UpstreamNotFound`], any other non-2xx to
/// [`NimeError::UpstreamStatus`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    resource: &str,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| NimeError::HttpError(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(NimeError::RateLimited(resource.to_string()));
    }
    if status == StatusCode::NOT_FOUND {
        return Err(NimeError::UpstreamNotFound(resource.to_string()));
    }
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(NimeError::UpstreamStatus {
            status: status.as_u16(),
            reason: truncate(&text, 200),
        });
    }

    response
        .json()
        .await
        .map_err(|e| NimeError::HttpError(format!("Invalid JSON from upstream: {}", e)))
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
