//! Configuration file parser for ~/.config/sermon-feed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::feed::DEFAULT_FEED_BASE;

/// Environment variable that overrides `channel_id` from the file.
pub const CHANNEL_ID_ENV: &str = "SERMON_FEED_CHANNEL_ID";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A value parsed but is not usable.
    #[error("Invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level service configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP endpoint listens on.
    pub bind_addr: String,

    /// Feed endpoint; `?channel_id=<id>` is appended per request.
    pub feed_base_url: String,

    /// Channel shown on the sermon board. `None` disables the board.
    pub channel_id: Option<String>,

    /// Sermon board refresh interval in seconds. 0 = manual refresh only.
    pub poll_interval_secs: u64,

    /// Upstream request timeout in seconds. 0 = transport default.
    pub request_timeout_secs: u64,

    /// Maximum accepted feed body size.
    pub max_feed_size_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".to_string(),
            feed_base_url: DEFAULT_FEED_BASE.to_string(),
            channel_id: None,
            poll_interval_secs: 300,
            request_timeout_secs: 0,
            max_feed_size_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "bind_addr",
        "feed_base_url",
        "channel_id",
        "poll_interval_secs",
        "request_timeout_secs",
        "max_feed_size_bytes",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), bind = %config.bind_addr, "Loaded configuration");
        Ok(config)
    }

    /// Applies environment overrides. The env var takes precedence over the
    /// file; a blank value is ignored.
    pub fn apply_env(mut self) -> Self {
        if let Ok(id) = std::env::var(CHANNEL_ID_ENV) {
            self = self.with_channel_override(Some(id));
        }
        self
    }

    fn with_channel_override(mut self, id: Option<String>) -> Self {
        if let Some(id) = id.filter(|id| !id.trim().is_empty()) {
            self.channel_id = Some(id);
        }
        self
    }

    /// Checks values that TOML types alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        self.feed_base()?;
        if self.max_feed_size_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "max_feed_size_bytes",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "bind_addr",
                reason: e.to_string(),
            })
    }

    pub fn feed_base(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.feed_base_url).map_err(|e| ConfigError::Invalid {
            key: "feed_base_url",
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid {
                key: "feed_base_url",
                reason: format!("unsupported scheme: {} (only http/https allowed)", other),
            }),
        }
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

// ============================================================================
// Tests
// ============================================================================
