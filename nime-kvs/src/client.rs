//! Envelope-aware cache client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use nime_core::error::{NimeError, Result};
use nime_core::traits::{Clock, KvStore, SystemClock};
use nime_core::types::{CacheEnvelope, CacheLookup};

/// Typed get/put of [`CacheEnvelope`]s against a [`KvStore`].
///
/// This is the only component that talks to the store. It stamps expiry on
/// write and marks everything it reads back as cached.
#[derive(Clone)]
pub struct CacheClient {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl CacheClient {
    /// Creates a client using the wall clock.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Creates a client with an explicit clock.
    pub fn with_clock(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Current time according to the client's clock.
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Reads `key`, keeping backend failures distinct from misses.
    #[instrument(skip(self))]
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let document = match self.store.read(key).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!(key, "Cache miss");
                return CacheLookup::Miss;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                return CacheLookup::BackendError(e);
            }
        };

        match serde_json::from_value::<CacheEnvelope<T>>(document) {
            Ok(mut envelope) => {
                envelope.cached = true;
                debug!(key, expiry = envelope.expiry, "Cache hit");
                CacheLookup::Hit(envelope)
            }
            Err(e) => {
                warn!(key, error = %e, "Malformed cache value, treating as miss");
                CacheLookup::BackendError(NimeError::MalformedCacheValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Reads `key`; any failure is logged and reported as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEnvelope<T>> {
        self.lookup(key).await.into_envelope()
    }

    /// Wraps `value` in a fresh envelope and writes it under `key`.
    ///
    /// Returns the expiry that was written. Failures are returned, never
    /// swallowed, so a failed population is not mistaken for a stored one.
    #[instrument(skip(self, value))]
    pub async fn put<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<i64> {
        let envelope = CacheEnvelope::new(value, self.clock.now_ms());
        let document = serde_json::to_value(&envelope)?;

        self.store.write(key, &document).await?;
        debug!(key, expiry = envelope.expiry, "Cache populated");
        Ok(envelope.expiry)
    }
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient").finish_non_exhaustive()
    }
}
