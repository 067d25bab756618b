//! Release index + synchronizer.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use nime_core::error::{NimeError, Result};
use nime_core::traits::ReleaseIndex;
use nime_core::types::{CacheEnvelope, ReleaseRecord};

use crate::sync::{ReleaseSynchronizer, SyncReport};

/// Release operations backed by an external index.
#[derive(Clone)]
pub struct ReleaseService {
    index: Arc<dyn ReleaseIndex>,
    sync: ReleaseSynchronizer,
}

impl ReleaseService {
    /// Creates a service over `index`, storing through `sync`.
    pub fn new(index: Arc<dyn ReleaseIndex>, sync: ReleaseSynchronizer) -> Self {
        Self { index, sync }
    }

    /// Re-reads the index and rewrites both channel slots.
    ///
    /// Fails only when the index itself cannot be read; per-channel store
    /// failures are reported in the [`SyncReport`].
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<SyncReport> {
        let releases = self.index.list_releases().await?;
        debug!(count = releases.len(), "Release index fetched");
        Ok(self.sync.sync_channel(releases).await)
    }

    /// Stored release for the wanted channel, with fallback.
    pub async fn latest(&self, want_prerelease: bool) -> Result<CacheEnvelope<ReleaseRecord>> {
        self.sync.get_latest(want_prerelease).await
    }

    /// Downloads the updater manifest attached to the stored release.
    #[instrument(skip(self))]
    pub async fn manifest(&self, want_prerelease: bool) -> Result<Value> {
        let release = self.sync.get_latest(want_prerelease).await?.into_value();

        let asset = release
            .manifest_asset()
            .ok_or_else(|| NimeError::ManifestMissing(release.tag.clone()))?;

        debug!(tag = %release.tag, url = %asset.browser_download_url, "Downloading manifest");
        self.index.download_json(&asset.browser_download_url).await
    }
}

impl std::fmt::Debug for ReleaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseService")
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}
