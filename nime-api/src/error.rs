//! API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nime_core::error::NimeError;
use serde::Serialize;

/// API error type.
///
/// Renders as `{"error": "<message>"}`. Messages are written for callers;
/// internal detail goes to the log only.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Upstream dependency failed.
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Message sent to the caller.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<NimeError> for ApiError {
    fn from(err: NimeError) -> Self {
        match &err {
            NimeError::SignatureMissing | NimeError::SignatureInvalid => {
                ApiError::bad_request(err.to_string())
            }
            NimeError::ValidationError(message) => ApiError::bad_request(message.clone()),
            NimeError::NoReleases => ApiError::not_found(err.to_string()),
            NimeError::ManifestMissing(_) => ApiError::not_found("latest.json not found"),
            NimeError::UpstreamNotFound(_) => ApiError::not_found("Resource not found"),
            _ if err.is_upstream_error() => {
                tracing::warn!(error = %err, "Upstream failure");
                ApiError::bad_gateway("Upstream request failed")
            }
            _ => {
                tracing::error!(error = %err, "Internal error");
                ApiError::internal("An internal error occurred")
            }
        }
    }
}
