//! In-memory key-value store.
//!
//! Thread-safe stand-in for the HTTP store, suitable for development,
//! tests and single-process deployments without a store credential.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde_json::Value;
use tracing::{debug, instrument};

use nime_core::error::{NimeError, Result};
use nime_core::traits::KvStore;

/// In-memory [`KvStore`].
///
/// Keys can be marked unavailable to exercise the failure paths of the
/// cache client without a network.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
    failing_reads: DashSet<String>,
    failing_writes: DashSet<String>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a raw document, bypassing envelope handling.
    pub fn insert_raw(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    /// Returns the raw document under `key`.
    pub fn get_raw(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Makes every read of `key` fail as if the backend were down.
    pub fn fail_reads_for(&self, key: &str) {
        self.failing_reads.insert(key.to_string());
    }

    /// Makes every write of `key` fail as if the backend were down.
    pub fn fail_writes_for(&self, key: &str) {
        self.failing_writes.insert(key.to_string());
    }

    /// Number of read requests served (including failed ones).
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of write requests received (including failed ones).
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    #[instrument(skip(self))]
    async fn read(&self, key: &str) -> Result<Option<Value>> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        if self.failing_reads.contains(key) {
            return Err(NimeError::CacheReadFailed {
                key: key.to_string(),
                reason: "store unavailable".into(),
            });
        }

        Ok(self.get_raw(key))
    }

    #[instrument(skip(self, value))]
    async fn write(&self, key: &str, value: &Value) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);

        if self.failing_writes.contains(key) {
            return Err(NimeError::CacheWriteFailed {
                key: key.to_string(),
                reason: "store unavailable".into(),
            });
        }

        self.entries.insert(key.to_string(), value.clone());
        debug!(key, "Stored in memory");
        Ok(())
    }
}
