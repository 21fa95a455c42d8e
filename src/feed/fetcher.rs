use chrono::Utc;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::parser::{parse_entries, ParseError, ParseResult};
use super::types::ChannelVideos;

/// Public feed endpoint; the channel id is appended as `?channel_id=`.
pub const DEFAULT_FEED_BASE: &str = "https://www.youtube.com/feeds/videos.xml";
const DEFAULT_MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Coarse classification of a [`FeedError`], as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied no usable channel id.
    InvalidRequest,
    /// The upstream feed could not be retrieved.
    FeedUnavailable,
    /// Anything else that went wrong while processing the response.
    UnexpectedFailure,
}

impl ErrorKind {
    /// HTTP status used when the error is returned from the endpoint.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::FeedUnavailable | ErrorKind::UnexpectedFailure => 500,
        }
    }
}

/// Errors that can occur while fetching and normalizing a channel feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Missing or blank channel id
    #[error("{0}")]
    InvalidRequest(String),
    /// HTTP response with non-2xx status code
    #[error("Failed to fetch YouTube feed: {0}")]
    HttpStatus(u16),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Failed to fetch YouTube feed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Failed to fetch YouTube feed: request timed out")]
    Timeout,
    /// Response body failed partway through
    #[error("Failed to read YouTube feed body: {0}")]
    Body(reqwest::Error),
    /// Response body exceeded the size limit
    #[error("Feed response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Response body is not UTF-8 text
    #[error("Feed response is not valid UTF-8")]
    InvalidUtf8,
    /// Feed body could not be read as XML
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            FeedError::HttpStatus(_) | FeedError::Network(_) | FeedError::Timeout => {
                ErrorKind::FeedUnavailable
            }
            FeedError::Body(_)
            | FeedError::ResponseTooLarge(_)
            | FeedError::InvalidUtf8
            | FeedError::Parse(_) => ErrorKind::UnexpectedFailure,
        }
    }

    /// Upstream HTTP status, when the failure came from one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            FeedError::HttpStatus(status) => Some(*status),
            FeedError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Fetches channel feeds and normalizes them into [`ChannelVideos`].
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    feed_base: Url,
    timeout: Option<Duration>,
    max_feed_size: usize,
}

impl FeedClient {
    /// Creates a client for the given feed endpoint.
    ///
    /// No timeout is applied beyond the transport's own defaults and the body
    /// size limit is 10MB; see [`FeedClient::with_timeout`] and
    /// [`FeedClient::with_max_feed_size`].
    pub fn new(client: reqwest::Client, feed_base: Url) -> Self {
        Self {
            client,
            feed_base,
            timeout: None,
            max_feed_size: DEFAULT_MAX_FEED_SIZE,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_feed_size(mut self, limit: usize) -> Self {
        self.max_feed_size = limit;
        self
    }

    /// Builds `<feed_base>?channel_id=<channel_id>`, query-encoding the id.
    pub fn feed_url(&self, channel_id: &str) -> Url {
        let mut url = self.feed_base.clone();
        url.query_pairs_mut().append_pair("channel_id", channel_id);
        url
    }

    /// Fetches a channel's public video feed and extracts its videos.
    ///
    /// Issues exactly one GET with no retry. Entries without a video id are
    /// dropped; every other per-entry problem is absorbed into empty or
    /// fallback fields. The returned videos keep the feed's order and are not
    /// deduplicated.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidRequest`] - `channel_id` is empty or blank
    /// - [`FeedError::HttpStatus`] - Non-2xx upstream response
    /// - [`FeedError::Network`] / [`FeedError::Timeout`] - Transport failure
    /// - [`FeedError::Body`] / [`FeedError::ResponseTooLarge`] /
    ///   [`FeedError::InvalidUtf8`] / [`FeedError::Parse`] - The body could
    ///   not be read or processed
    ///
    /// The timeout, when set, covers the whole exchange including the body.
    pub async fn fetch_channel_videos(&self, channel_id: &str) -> Result<ChannelVideos, FeedError> {
        if channel_id.trim().is_empty() {
            return Err(FeedError::InvalidRequest("Channel ID is required".to_string()));
        }

        let download = self.download(channel_id);
        let bytes = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, download)
                .await
                .map_err(|_| FeedError::Timeout)??,
            None => download.await?,
        };
        let body = std::str::from_utf8(&bytes).map_err(|_| FeedError::InvalidUtf8)?;

        let ParseResult { videos, skipped } = parse_entries(body)?;
        if skipped > 0 {
            tracing::warn!(
                channel = %channel_id,
                skipped = skipped,
                "Feed entries without a video id skipped"
            );
        }
        tracing::debug!(channel = %channel_id, videos = videos.len(), "Fetched channel feed");

        Ok(ChannelVideos {
            videos,
            fetched_at: Utc::now(),
        })
    }

    async fn download(&self, channel_id: &str) -> Result<Vec<u8>, FeedError> {
        let response = self.client.get(self.feed_url(channel_id)).send().await?;

        if !response.status().is_success() {
            tracing::warn!(
                channel = %channel_id,
                status = %response.status(),
                "Feed request returned non-success status"
            );
            return Err(FeedError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, self.max_feed_size).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FeedError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if usize::try_from(len).map_or(true, |len| len > limit) {
            return Err(FeedError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FeedError::Body)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FeedError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
