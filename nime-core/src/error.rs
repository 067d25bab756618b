//! Error types for NIME.
//!
//! One `thiserror` hierarchy covers the cache, upstream and webhook paths.
//! The HTTP layer maps each variant onto a status class; nothing here is
//! meant to be shown to API callers verbatim.

use thiserror::Error;

/// Result type alias using `NimeError`.
pub type Result<T> = std::result::Result<T, NimeError>;

/// Main error type for all NIME operations.
#[derive(Debug, Error)]
pub enum NimeError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The key-value store could not be read.
    #[error("Cache read failed for '{key}': {reason}")]
    CacheReadFailed { key: String, reason: String },

    /// The key-value store rejected or never received a write.
    #[error("Cache write failed for '{key}': {reason}")]
    CacheWriteFailed { key: String, reason: String },

    /// A stored value did not have the envelope shape.
    #[error("Malformed cache value for '{key}': {reason}")]
    MalformedCacheValue { key: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════════
    // UPSTREAM ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Upstream answered with HTTP 429.
    #[error("Upstream rate limited: {0}")]
    RateLimited(String),

    /// Rate limiting persisted past the retry budget.
    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    /// Upstream answered with a non-2xx status other than 429.
    #[error("Upstream returned HTTP {status}: {reason}")]
    UpstreamStatus { status: u16, reason: String },

    /// Upstream does not know the requested resource.
    #[error("Upstream resource not found: {0}")]
    UpstreamNotFound(String),

    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // RELEASE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Neither release channel holds a release.
    #[error("No updates found")]
    NoReleases,

    /// The selected release carries no updater manifest.
    #[error("Release '{0}' has no latest.json asset")]
    ManifestMissing(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // WEBHOOK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Signature header absent.
    #[error("Signature is required.")]
    SignatureMissing,

    /// Signature header present but not acceptable.
    #[error("Signature is invalid.")]
    SignatureInvalid,

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl NimeError {
    /// Returns true if the operation may succeed when retried.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NimeError::RateLimited(_)
                | NimeError::HttpError(_)
                | NimeError::CacheReadFailed { .. }
                | NimeError::CacheWriteFailed { .. }
        )
    }

    /// Returns true if this error means "nothing there" rather than "broken".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NimeError::NoReleases | NimeError::ManifestMissing(_) | NimeError::UpstreamNotFound(_)
        )
    }

    /// Returns true if the caller sent something unacceptable.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            NimeError::SignatureMissing
                | NimeError::SignatureInvalid
                | NimeError::ValidationError(_)
                | NimeError::HexError(_)
        )
    }

    /// Returns true if an upstream dependency failed.
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            NimeError::RateLimited(_)
                | NimeError::MaxRetriesExceeded { .. }
                | NimeError::UpstreamStatus { .. }
                | NimeError::HttpError(_)
        )
    }
}
