//! Release index types.
//!
//! Field names follow the GitHub releases API so records deserialize
//! straight from the index and round-trip through the cache unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{LATEST_KEY, LATEST_PRE_KEY, MANIFEST_ASSET};

/// One release as published in the release index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Git tag of the release
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Publication time; drafts have none
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Unpublished draft, never eligible for a channel
    #[serde(default)]
    pub draft: bool,
    /// Belongs to the prerelease channel
    #[serde(default)]
    pub prerelease: bool,
    /// Downloadable files attached to the release
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseRecord {
    /// Creates a published, non-draft release.
    pub fn new(tag: impl Into<String>, published_at: DateTime<Utc>, prerelease: bool) -> Self {
        Self {
            tag: tag.into(),
            published_at: Some(published_at),
            draft: false,
            prerelease,
            assets: Vec::new(),
        }
    }

    /// Marks the record as a draft.
    pub fn as_draft(mut self) -> Self {
        self.draft = true;
        self
    }

    /// Attaches an asset.
    pub fn with_asset(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.assets.push(ReleaseAsset {
            name: name.into(),
            browser_download_url: url.into(),
        });
        self
    }

    /// Channel this release belongs to.
    pub fn channel(&self) -> Channel {
        if self.prerelease {
            Channel::Prerelease
        } else {
            Channel::Stable
        }
    }

    /// Finds an asset by exact file name.
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    /// The updater manifest asset, if attached.
    pub fn manifest_asset(&self) -> Option<&ReleaseAsset> {
        self.asset(MANIFEST_ASSET)
    }
}

/// A file attached to a release.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// File name
    pub name: String,
    /// Public download URL
    pub browser_download_url: String,
}

/// Update channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Regular releases
    Stable,
    /// Releases flagged as prerelease
    Prerelease,
}

impl Channel {
    /// Picks the channel from a "want prerelease" flag.
    pub fn from_prerelease(prerelease: bool) -> Self {
        if prerelease {
            Channel::Prerelease
        } else {
            Channel::Stable
        }
    }

    /// Cache key the channel's release is stored under.
    pub fn cache_key(self) -> &'static str {
        match self {
            Channel::Stable => LATEST_KEY,
            Channel::Prerelease => LATEST_PRE_KEY,
        }
    }

    /// The other channel, used for fallback reads.
    pub fn other(self) -> Self {
        match self {
            Channel::Stable => Channel::Prerelease,
            Channel::Prerelease => Channel::Stable,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Stable => write!(f, "stable"),
            Channel::Prerelease => write!(f, "prerelease"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_github_release() {
        let raw = json!({
            "tag_name": "v1.2.0",
            "published_at": "2024-05-01T12:00:00Z",
            "draft": false,
            "prerelease": false,
            "html_url": "https://github.com/Waradu/a.ni.me/releases/tag/v1.2.0",
            "assets": [
                { "name": "latest.json", "browser_download_url": "https://example.com/latest.json", "size": 120 }
            ]
        });
        let release: ReleaseRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(release.tag, "v1.2.0");
        assert_eq!(release.channel(), Channel::Stable);
        assert_eq!(
            release.manifest_asset().map(|a| a.browser_download_url.as_str()),
            Some("https://example.com/latest.json")
        );
    }

    #[test]
    fn test_draft_without_publish_date() {
        let raw = json!({ "tag_name": "v2.0.0", "published_at": null, "draft": true, "prerelease": false });
        let release: ReleaseRecord = serde_json::from_value(raw).unwrap();
        assert!(release.draft);
        assert!(release.published_at.is_none());
        assert!(release.assets.is_empty());
    }

    #[test]
    fn test_channel_keys_and_fallback() {
        assert_eq!(Channel::Stable.cache_key(), LATEST_KEY);
        assert_eq!(Channel::Prerelease.cache_key(), LATEST_PRE_KEY);
        assert_eq!(Channel::Stable.other(), Channel::Prerelease);
        assert_eq!(Channel::from_prerelease(true), Channel::Prerelease);
    }
}
