use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Base URL for the deterministic thumbnail used when an entry has none.
const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";
/// Base URL for the canonical watch page of a video.
const WATCH_BASE: &str = "https://www.youtube.com/watch?v=";

/// One video from a channel feed, ready for display.
///
/// `link` and the fallback `thumbnail` are derived from `id` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    /// External video id. Never empty.
    pub id: String,
    /// Entity-decoded title, empty if the entry had none.
    pub title: String,
    /// Entity-decoded description, empty if the entry had none.
    pub description: String,
    /// Publish timestamp exactly as the feed wrote it.
    pub published_at: String,
    /// Preview image URL.
    pub thumbnail: String,
    /// Watch page URL.
    pub link: String,
}

impl VideoSummary {
    /// Thumbnail URL used when the feed omits `media:thumbnail`.
    pub fn fallback_thumbnail(id: &str) -> String {
        format!("{}/{}/maxresdefault.jpg", THUMBNAIL_BASE, id)
    }

    /// Canonical watch page for a video id.
    pub fn watch_link(id: &str) -> String {
        format!("{}{}", WATCH_BASE, id)
    }
}

/// Successful result of a channel fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVideos {
    /// Videos in feed document order.
    pub videos: Vec<VideoSummary>,
    /// When the fetch completed.
    #[serde(serialize_with = "serialize_iso8601")]
    pub fetched_at: DateTime<Utc>,
}

/// Request payload for the invocation endpoint: `{ "channelId": "..." }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRequest {
    #[serde(default)]
    pub channel_id: Option<String>,
}

/// Serializes as `2026-01-26T15:04:05.123Z`, the shape JavaScript's
/// `toISOString()` produces.
pub(crate) fn serialize_iso8601<S: Serializer>(
    ts: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
