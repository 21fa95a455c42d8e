//! Sermon video feed service for the church website.
//!
//! Fetches a YouTube channel's public feed, normalizes it into
//! [`feed::VideoSummary`] records and serves them over a CORS-enabled HTTP
//! endpoint. A [`board::FeedPoller`] keeps a refreshed copy for the sermons
//! page, and [`focal`] handles carousel image focal points.

pub mod board;
pub mod config;
pub mod feed;
pub mod focal;
pub mod server;
pub mod util;
