//! Cache-aside orchestration.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use nime_core::error::{NimeError, Result};
use nime_core::traits::UpstreamSource;
use nime_core::types::Resolved;
use nime_kvs::CacheClient;

/// Resolves keys against the store first and the upstream second.
#[derive(Clone)]
pub struct CacheAside {
    cache: CacheClient,
    upstream: Arc<dyn UpstreamSource>,
}

impl CacheAside {
    /// Creates a resolver over a cache client and an upstream source.
    pub fn new(cache: CacheClient, upstream: Arc<dyn UpstreamSource>) -> Self {
        Self { cache, upstream }
    }

    /// Resolves `key` to a payload with an explicit freshness flag.
    ///
    /// A fresh envelope is served without touching the upstream. A stale,
    /// absent or unreadable one triggers exactly one upstream fetch (which
    /// retries internally on rate limiting); on success the store is
    /// repopulated best-effort. Upstream failures are returned as-is.
    ///
    /// Surrounding whitespace is not part of the key.
    #[instrument(skip(self))]
    pub async fn resolve(&self, key: &str) -> Result<Resolved<Value>> {
        let key = key.trim();
        if key.is_empty() {
            return Err(NimeError::ValidationError("Cache key cannot be empty".into()));
        }

        let now = self.cache.now_ms();

        if let Some(envelope) = self.cache.get::<Value>(key).await {
            if envelope.is_fresh(now) {
                debug!(key, remaining_ms = envelope.remaining_ms(now), "Serving from cache");
                return Ok(Resolved::from_cache(envelope));
            }
            debug!(key, expiry = envelope.expiry, "Cached entry expired");
        }

        let payload = self.upstream.fetch(key).await?;

        if let Err(e) = self.cache.put(key, &payload).await {
            warn!(key, error = %e, "Failed to populate cache");
        }

        Ok(Resolved::fresh(payload))
    }
}

impl std::fmt::Debug for CacheAside {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAside")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
