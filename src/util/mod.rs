//! Utility functions for common operations.
//!
//! - **Text processing**: decoding the small set of HTML entities that show
//!   up in video titles and descriptions
//!
//! # Examples
//!
//! ```
//! use sermon_feed::util::decode_html_entities;
//!
//! assert_eq!(decode_html_entities("Joy &amp; Peace"), "Joy & Peace");
//! ```

mod text;

pub use text::decode_html_entities;
