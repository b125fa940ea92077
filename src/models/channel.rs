use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Group name given to channels without a `group-title`
pub const DEFAULT_GROUP: &str = "Uncategorized";

/// Identifier of the synthetic category that matches every channel
pub const ALL_CHANNELS_ID: &str = "all";

/// Display name of the synthetic category that matches every channel
pub const ALL_CHANNELS_NAME: &str = "All Channels";

/// DRM configuration forwarded opaquely to the playback backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrmConfig {
    /// Key system identifier, e.g. `com.widevine.alpha` or `clearkey`
    pub key_system: String,
    pub license_url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Custom HTTP parameters a stream requires
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpHeaders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

impl HttpHeaders {
    pub fn is_empty(&self) -> bool {
        self.user_agent.is_none() && self.referrer.is_none()
    }
}

/// Single channel parsed from a playlist. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Internal identifier, unique within one parse
    pub id: String,
    /// `tvg-id` supplied by the playlist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvg_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub group: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drm: Option<DrmConfig>,
    #[serde(default, skip_serializing_if = "HttpHeaders::is_empty")]
    pub headers: HttpHeaders,
}

/// Category derived from distinct group names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn all_channels() -> Self {
        Self {
            id: ALL_CHANNELS_ID.to_string(),
            name: ALL_CHANNELS_NAME.to_string(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.id == ALL_CHANNELS_ID
    }
}

/// Parsed playlist: ordered channels plus the derived category list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub channels: Vec<Channel>,
    pub categories: Vec<Category>,
}

impl Playlist {
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Channels belonging to a category. The "All Channels" id yields everything;
    /// an unknown id yields nothing.
    pub fn channels_in<'a>(&'a self, category_id: &str) -> Vec<&'a Channel> {
        let Some(category) = self.categories.iter().find(|c| c.id == category_id) else {
            return Vec::new();
        };

        if category.is_all() {
            return self.channels.iter().collect();
        }
        self.channels
            .iter()
            .filter(|c| c.group == category.name)
            .collect()
    }

    /// Remove a dead channel. Returns the index it occupied, so the caller can
    /// advance to whatever now sits at that position (see [`Playlist::channel_at_wrapping`]).
    pub fn remove_channel(&mut self, id: &str) -> Option<usize> {
        let index = self.channels.iter().position(|c| c.id == id)?;
        self.channels.remove(index);
        Some(index)
    }

    /// Channel at `index`, wrapping to the first channel past the end
    pub fn channel_at_wrapping(&self, index: usize) -> Option<&Channel> {
        if self.channels.is_empty() {
            return None;
        }
        self.channels.get(index).or_else(|| self.channels.first())
    }
}
