//! Cache envelope types.
//!
//! Every value written to the key-value store is wrapped in a
//! [`CacheEnvelope`] carrying its expiry. The payload is flattened on the
//! wire, so a cached anime entry looks like the upstream document with two
//! extra fields:
//!
//! ```text
//! { "data": { ... }, "expiry": 1718000000000, "cached": true }
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::CACHE_TTL_MS;
use crate::error::NimeError;

/// A payload together with its expiry timestamp and cached flag.
///
/// Envelopes are never mutated after storage; a refresh writes a new one
/// under the same key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    /// The cached payload (flattened into the envelope object)
    #[serde(flatten)]
    pub value: T,
    /// Unix timestamp in milliseconds after which the entry is stale
    pub expiry: i64,
    /// True for anything read back from the store
    pub cached: bool,
}

impl<T> CacheEnvelope<T> {
    /// Wraps a value for storage at `now_ms`, expiring one TTL later.
    pub fn new(value: T, now_ms: i64) -> Self {
        Self {
            value,
            expiry: now_ms.saturating_add(CACHE_TTL_MS),
            cached: true,
        }
    }

    /// Returns true while `now_ms` is strictly before the expiry.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms < self.expiry
    }

    /// Milliseconds until expiry, zero once stale.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.expiry.saturating_sub(now_ms).max(0)
    }

    /// Unwraps the payload.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Outcome of a single cache read.
///
/// The KV client keeps backend failures distinct from plain misses so they
/// can be logged and tested; the cache-aside boundary treats both as a miss.
#[derive(Debug)]
pub enum CacheLookup<T> {
    /// An envelope was found and decoded (it may still be stale).
    Hit(CacheEnvelope<T>),
    /// The store has nothing under the key.
    Miss,
    /// The store failed or returned something undecodable.
    BackendError(NimeError),
}

impl<T> CacheLookup<T> {
    /// Collapses misses and backend errors to `None`.
    pub fn into_envelope(self) -> Option<CacheEnvelope<T>> {
        match self {
            CacheLookup::Hit(envelope) => Some(envelope),
            CacheLookup::Miss | CacheLookup::BackendError(_) => None,
        }
    }

    /// Returns true for [`CacheLookup::Hit`].
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    /// Returns true for [`CacheLookup::BackendError`].
    pub fn is_backend_error(&self) -> bool {
        matches!(self, CacheLookup::BackendError(_))
    }
}

/// Payload returned by the cache-aside pipeline.
///
/// Serializes flattened with a `cached` flag, plus `expiry` when the value
/// came out of the store.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resolved<T> {
    /// The payload
    #[serde(flatten)]
    pub value: T,
    /// Expiry of the envelope the value was served from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    /// Whether the value was served from the store
    #[serde(rename = "cached")]
    pub served_from_cache: bool,
}

impl<T> Resolved<T> {
    /// A value served out of a fresh envelope.
    pub fn from_cache(envelope: CacheEnvelope<T>) -> Self {
        Self {
            expiry: Some(envelope.expiry),
            value: envelope.value,
            served_from_cache: true,
        }
    }

    /// A value fetched from upstream within the current request.
    pub fn fresh(value: T) -> Self {
        Self {
            value,
            expiry: None,
            served_from_cache: false,
        }
    }
}
