//! Release channel synchronization.

use serde::Serialize;
use tracing::{debug, error, info, instrument};

use nime_core::error::{NimeError, Result};
use nime_core::types::{CacheEnvelope, Channel, ReleaseRecord};
use nime_kvs::CacheClient;

use crate::select::select_channels;

/// What happened to one channel during a sync.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelOutcome {
    /// No eligible release; the slot was left untouched
    NoCandidate,
    /// The selected release was stored
    Written {
        /// Tag of the stored release
        tag: String,
        /// Expiry written with it
        expiry: i64,
    },
    /// A release was selected but storing it failed
    WriteFailed {
        /// Tag of the selected release
        tag: String,
        /// Store error
        reason: String,
    },
}

impl ChannelOutcome {
    /// True if a release was selected for the channel.
    pub fn is_selected(&self) -> bool {
        !matches!(self, ChannelOutcome::NoCandidate)
    }

    /// True if the selected release was stored.
    pub fn is_written(&self) -> bool {
        matches!(self, ChannelOutcome::Written { .. })
    }

    /// Tag of the stored release, if any.
    pub fn written_tag(&self) -> Option<&str> {
        match self {
            ChannelOutcome::Written { tag, .. } => Some(tag),
            _ => None,
        }
    }
}

/// Per-channel result of [`ReleaseSynchronizer::sync_channel`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// The "latest" slot
    pub stable: ChannelOutcome,
    /// The "latest-pre" slot
    pub prerelease: ChannelOutcome,
}

impl SyncReport {
    /// True if no selected release failed to store.
    pub fn is_complete(&self) -> bool {
        [&self.stable, &self.prerelease]
            .iter()
            .all(|outcome| !outcome.is_selected() || outcome.is_written())
    }
}

/// Owner of the "latest" and "latest-pre" cache slots.
#[derive(Clone, Debug)]
pub struct ReleaseSynchronizer {
    cache: CacheClient,
}

impl ReleaseSynchronizer {
    /// Creates a synchronizer writing through `cache`.
    pub fn new(cache: CacheClient) -> Self {
        Self { cache }
    }

    /// Stores the newest release of each channel.
    ///
    /// Channels are written independently: a failed write on one never
    /// skips the other. Nothing eligible means nothing written.
    #[instrument(skip(self, releases), fields(count = releases.len()))]
    pub async fn sync_channel(&self, releases: Vec<ReleaseRecord>) -> SyncReport {
        let selection = select_channels(releases);

        let stable = self.store(Channel::Stable, selection.stable.as_ref()).await;
        let prerelease = self
            .store(Channel::Prerelease, selection.prerelease.as_ref())
            .await;

        let report = SyncReport { stable, prerelease };
        info!(
            latest = report.stable.written_tag(),
            latest_pre = report.prerelease.written_tag(),
            complete = report.is_complete(),
            "Release sync finished"
        );
        report
    }

    async fn store(&self, channel: Channel, release: Option<&ReleaseRecord>) -> ChannelOutcome {
        let Some(release) = release else {
            debug!(%channel, "No eligible release");
            return ChannelOutcome::NoCandidate;
        };

        match self.cache.put(channel.cache_key(), release).await {
            Ok(expiry) => ChannelOutcome::Written {
                tag: release.tag.clone(),
                expiry,
            },
            Err(e) => {
                error!(%channel, tag = %release.tag, error = %e, "Failed to store release");
                ChannelOutcome::WriteFailed {
                    tag: release.tag.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Reads the stored release for the wanted channel.
    ///
    /// Falls back to the other channel when the wanted slot is empty, and
    /// fails with [`NimeError::NoReleases`] when both are.
    #[instrument(skip(self))]
    pub async fn get_latest(&self, want_prerelease: bool) -> Result<CacheEnvelope<ReleaseRecord>> {
        let wanted = Channel::from_prerelease(want_prerelease);

        if let Some(envelope) = self.cache.get(wanted.cache_key()).await {
            return Ok(envelope);
        }

        let fallback = wanted.other();
        match self.cache.get(fallback.cache_key()).await {
            Some(envelope) => {
                debug!(%wanted, %fallback, "Falling back to other channel");
                Ok(envelope)
            }
            None => Err(NimeError::NoReleases),
        }
    }
}
