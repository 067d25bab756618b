//! Common traits for NIME.
//!
//! Every external collaborator sits behind one of these so the cache-aside
//! pipeline and the release synchronizer can run against in-memory fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::ReleaseRecord;

// ═══════════════════════════════════════════════════════════════════════════════
// KEY-VALUE STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Raw access to the external key-value store.
///
/// Values are JSON documents (already-built envelopes). Implementations own
/// the wire format; callers own the envelope semantics.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads the document under `key`.
    ///
    /// Returns `Ok(None)` when the store has nothing there and `Err` when the
    /// store could not be asked or answered with garbage.
    async fn read(&self, key: &str) -> Result<Option<Value>>;

    /// Replaces the document under `key` in one request.
    async fn write(&self, key: &str, value: &Value) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM SOURCES
// ═══════════════════════════════════════════════════════════════════════════════

/// A rate-limited upstream serving JSON documents by identifier.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Fetches the resource, retrying on rate limiting per the source's policy.
    async fn fetch(&self, resource_id: &str) -> Result<Value>;
}

/// The external index of published releases.
#[async_trait]
pub trait ReleaseIndex: Send + Sync {
    /// Lists all releases, drafts included.
    async fn list_releases(&self) -> Result<Vec<ReleaseRecord>>;

    /// Downloads a JSON document attached to a release.
    async fn download_json(&self, url: &str) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCK
// ═══════════════════════════════════════════════════════════════════════════════

/// Source of "now" for envelope expiry.
pub trait Clock: Send + Sync {
    /// Current unix time in milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_current() {
        // 2024-01-01T00:00:00Z
        assert!(SystemClock.now_ms() > 1_704_067_200_000);
    }
}
