//! Channel feed normalization.
//!
//! Turns a channel's public video feed into an ordered list of
//! [`VideoSummary`] records:
//!
//! - **Parsing**: Lenient, per-entry extraction from the feed XML
//! - **Fetching**: A single HTTP GET per call, with no retry
//!
//! # Architecture
//!
//! - [`parser`] - Streaming `quick-xml` walk over `<entry>` elements
//! - [`fetcher`] - [`FeedClient`], the error taxonomy and body limits
//! - [`types`] - Wire types shared with the HTTP endpoint
//!
//! # Example
//!
//! ```ignore
//! use sermon_feed::feed::{FeedClient, DEFAULT_FEED_BASE};
//!
//! let client = FeedClient::new(reqwest::Client::new(), DEFAULT_FEED_BASE.parse()?);
//! let result = client.fetch_channel_videos("UC...").await?;
//! ```

mod fetcher;
mod parser;
mod types;

pub use fetcher::{ErrorKind, FeedClient, FeedError, DEFAULT_FEED_BASE};
pub use parser::{parse_entries, ParseError, ParseResult};
pub use types::{ChannelRequest, ChannelVideos, VideoSummary};
pub(crate) use types::serialize_iso8601;
