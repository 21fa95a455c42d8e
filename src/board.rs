//! Sermon board: the in-memory view of one channel's latest videos.
//!
//! [`FeedPoller`] refreshes the board on a fixed interval and on demand.
//! Only one fetch runs at a time; a refresh requested while another is in
//! flight is skipped rather than queued.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::feed::{serialize_iso8601, ChannelVideos, FeedClient, VideoSummary};

/// Latest known state of the channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SermonBoard {
    /// Videos from the last successful refresh, in feed order.
    pub videos: Vec<VideoSummary>,
    /// When the last successful refresh completed.
    #[serde(serialize_with = "serialize_opt_iso8601")]
    pub fetched_at: Option<DateTime<Utc>>,
    /// Id of the featured video.
    pub featured: Option<String>,
    /// Message from the most recent failed refresh, cleared on success.
    pub last_error: Option<String>,
}

impl SermonBoard {
    /// Replaces the videos with a fresh result.
    ///
    /// The featured video survives the refresh if it is still in the feed;
    /// otherwise the newest video (first in feed order) becomes featured.
    pub fn apply_success(&mut self, result: ChannelVideos) {
        let still_present = self
            .featured
            .as_deref()
            .is_some_and(|id| result.videos.iter().any(|v| v.id == id));
        if !still_present {
            self.featured = result.videos.first().map(|v| v.id.clone());
        }
        self.videos = result.videos;
        self.fetched_at = Some(result.fetched_at);
        self.last_error = None;
    }

    /// Records a failed refresh. Previously fetched videos stay visible.
    pub fn apply_failure(&mut self, message: String) {
        self.last_error = Some(message);
    }

    /// Marks `id` as featured. Returns `false` if no such video is listed.
    pub fn select_featured(&mut self, id: &str) -> bool {
        if self.videos.iter().any(|v| v.id == id) {
            self.featured = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn featured_video(&self) -> Option<&VideoSummary> {
        let id = self.featured.as_deref()?;
        self.videos.iter().find(|v| v.id == id)
    }
}

fn serialize_opt_iso8601<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serialize_iso8601(ts, serializer),
        None => serializer.serialize_none(),
    }
}

/// Result of a single [`FeedPoller::refresh_now`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The board now holds `videos` fresh videos.
    Refreshed { videos: usize },
    /// The fetch failed; the board kept its previous videos.
    Failed(String),
    /// Another refresh was already in flight.
    Skipped,
}

struct PollerInner {
    client: FeedClient,
    channel_id: String,
    board: RwLock<SermonBoard>,
    // Held for the duration of a fetch
    refresh_lock: Mutex<()>,
}

/// Keeps a [`SermonBoard`] up to date for one channel.
///
/// Cloning shares the same board and refresh lock.
#[derive(Clone)]
pub struct FeedPoller {
    inner: Arc<PollerInner>,
}

impl FeedPoller {
    pub fn new(client: FeedClient, channel_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                client,
                channel_id: channel_id.into(),
                board: RwLock::new(SermonBoard::default()),
                refresh_lock: Mutex::new(()),
            }),
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.inner.channel_id
    }

    /// A copy of the current board.
    pub async fn snapshot(&self) -> SermonBoard {
        self.inner.board.read().await.clone()
    }

    pub async fn select_featured(&self, id: &str) -> bool {
        self.inner.board.write().await.select_featured(id)
    }

    /// Fetches the channel once and applies the result to the board.
    ///
    /// Returns [`RefreshOutcome::Skipped`] without issuing a request when a
    /// refresh is already in flight.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        let Ok(_guard) = self.inner.refresh_lock.try_lock() else {
            tracing::debug!(channel = %self.inner.channel_id, "Refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        };

        match self
            .inner
            .client
            .fetch_channel_videos(&self.inner.channel_id)
            .await
        {
            Ok(result) => {
                let count = result.videos.len();
                self.inner.board.write().await.apply_success(result);
                tracing::info!(channel = %self.inner.channel_id, videos = count, "Sermon board refreshed");
                RefreshOutcome::Refreshed { videos: count }
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(
                    channel = %self.inner.channel_id,
                    error = %message,
                    "Sermon board refresh failed, keeping previous videos"
                );
                self.inner.board.write().await.apply_failure(message.clone());
                RefreshOutcome::Failed(message)
            }
        }
    }

    /// Starts periodic refreshing: once immediately, then every `interval`.
    ///
    /// Ticks that fall due while a refresh is still running are skipped.
    /// Polling stops when the returned handle is dropped. A zero interval
    /// disables polling and returns an idle handle.
    pub fn spawn(&self, interval: Duration) -> PollerHandle {
        if interval.is_zero() {
            tracing::info!(channel = %self.inner.channel_id, "Polling disabled by zero interval");
            return PollerHandle { handle: None };
        }

        let poller = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                poller.refresh_now().await;
            }
        });
        tracing::info!(
            channel = %self.inner.channel_id,
            interval_secs = interval.as_secs(),
            "Sermon board polling started"
        );
        PollerHandle {
            handle: Some(handle),
        }
    }
}

/// Owns the polling task; aborts it on drop.
pub struct PollerHandle {
    handle: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Whether a polling task is running.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
