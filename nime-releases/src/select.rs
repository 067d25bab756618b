//! Channel selection over a release list.

use nime_core::types::{Channel, ReleaseRecord};

/// The newest eligible release of each channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelSelection {
    /// Newest non-prerelease
    pub stable: Option<ReleaseRecord>,
    /// Newest prerelease
    pub prerelease: Option<ReleaseRecord>,
}

impl ChannelSelection {
    /// The selected release for `channel`.
    pub fn get(&self, channel: Channel) -> Option<&ReleaseRecord> {
        match channel {
            Channel::Stable => self.stable.as_ref(),
            Channel::Prerelease => self.prerelease.as_ref(),
        }
    }

    /// True when neither channel has a candidate.
    pub fn is_empty(&self) -> bool {
        self.stable.is_none() && self.prerelease.is_none()
    }
}

/// Picks the newest published release per channel.
///
/// Drafts and records without a publish time are ignored. Among records
/// sharing a publish time the one listed first wins.
pub fn select_channels(releases: Vec<ReleaseRecord>) -> ChannelSelection {
    let mut published: Vec<ReleaseRecord> = releases
        .into_iter()
        .filter(|release| !release.draft && release.published_at.is_some())
        .collect();

    // Stable sort, newest first
    published.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let mut selection = ChannelSelection::default();
    for release in published {
        let slot = match release.channel() {
            Channel::Stable => &mut selection.stable,
            Channel::Prerelease => &mut selection.prerelease,
        };
        if slot.is_none() {
            *slot = Some(release);
        }
        if selection.stable.is_some() && selection.prerelease.is_some() {
            break;
        }
    }
    selection
}
