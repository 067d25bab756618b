//! DTOs for API requests and responses.

use nime_releases::SyncReport;
use serde::{Deserialize, Serialize};

/// Query for `GET /api/anime`.
#[derive(Debug, Deserialize)]
pub struct AnimeQuery {
    /// Upstream anime id
    pub anime: Option<String>,
}

/// Query for the release routes. `?pre` (any value) asks for prereleases.
#[derive(Debug, Default, Deserialize)]
pub struct LatestQuery {
    /// Presence flag for the prerelease channel
    pub pre: Option<String>,
}

impl LatestQuery {
    /// True when the `pre` flag is present.
    pub fn wants_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

/// Query for `GET /api/image`.
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    /// CDN URL of the image
    pub url: Option<String>,
}

/// Query AniList appends to the OAuth redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code
    pub code: Option<String>,
}

/// Reply to a webhook `ping`.
#[derive(Debug, Serialize)]
pub struct PongResponse {
    /// Always `pong`
    pub message: &'static str,
}

/// Reply to an accepted webhook delivery: the tags now stored per channel.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct SyncResponse {
    /// Stored stable tag
    pub latest: Option<String>,
    /// Stored prerelease tag
    pub latest_pre: Option<String>,
}

impl From<&SyncReport> for SyncResponse {
    fn from(report: &SyncReport) -> Self {
        Self {
            latest: report.stable.written_tag().map(str::to_string),
            latest_pre: report.prerelease.written_tag().map(str::to_string),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Crate version
    pub version: String,
}
