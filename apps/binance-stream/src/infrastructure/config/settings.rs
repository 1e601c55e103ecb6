//! Stream Client Configuration Settings
//!
//! Configuration types for the stream client, loaded from environment variables.

use std::time::Duration;

use crate::domain::subscription::StreamName;
use crate::infrastructure::binance::{DEFAULT_STREAM_URL, StreamClientConfig};

/// Symbol streamed when neither combined streams nor a listen key are set.
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";

/// Default capacity of the trade delivery channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// User data stream listen key.
#[derive(Clone, PartialEq, Eq)]
pub struct ListenKey(String);

impl ListenKey {
    /// Wrap a listen key.
    #[must_use]
    pub const fn new(key: String) -> Self {
        Self(key)
    }

    /// Get the raw key.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ListenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ListenKey([REDACTED])")
    }
}

/// Which stream the client runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMode {
    /// Typed aggregate trade stream for one symbol.
    AggTrade {
        /// Symbol as configured; lower-cased when the stream is opened.
        symbol: String,
    },
    /// Combined stream over several subscriptions.
    Combined(Vec<StreamName>),
    /// Private user data stream.
    User(ListenKey),
}

impl StreamMode {
    /// Mode name for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AggTrade { .. } => "agg_trade",
            Self::Combined(_) => "combined",
            Self::User(_) => "user",
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Connection settings shared by every stream.
    pub client: StreamClientConfig,
    /// Stream to run.
    pub mode: StreamMode,
    /// Capacity of the trade delivery channel.
    pub channel_capacity: usize,
    /// Prometheus metrics port (0 = disabled).
    pub metrics_port: u16,
}

impl StreamConfig {
    /// Create configuration from environment variables.
    ///
    /// `BINANCE_STREAMS` (comma separated) selects a combined stream and wins
    /// over `BINANCE_LISTEN_KEY`, which wins over `BINANCE_SYMBOL`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a key holds an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = non_empty(&lookup, "BINANCE_STREAM_URL")?
            .unwrap_or_else(|| DEFAULT_STREAM_URL.to_string());

        let mut client = StreamClientConfig::new(base_url);
        if let Some(secs) = parse_u64(&lookup, "BINANCE_READ_TIMEOUT_SECS")?
            && secs > 0
        {
            client = client.with_read_timeout(Duration::from_secs(secs));
        }

        let mode = if let Some(raw) = lookup("BINANCE_STREAMS") {
            let names: Vec<StreamName> = raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(StreamName::from)
                .collect();
            if names.is_empty() {
                return Err(ConfigError::EmptyValue("BINANCE_STREAMS".to_string()));
            }
            StreamMode::Combined(names)
        } else if let Some(key) = non_empty(&lookup, "BINANCE_LISTEN_KEY")? {
            StreamMode::User(ListenKey::new(key))
        } else {
            let symbol = non_empty(&lookup, "BINANCE_SYMBOL")?
                .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
            StreamMode::AggTrade { symbol }
        };

        let channel_capacity = parse_usize(&lookup, "BINANCE_CHANNEL_CAPACITY")?
            .unwrap_or(DEFAULT_CHANNEL_CAPACITY);
        if channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BINANCE_CHANNEL_CAPACITY".to_string(),
                value: "0".to_string(),
            });
        }

        let metrics_port = parse_u16(&lookup, "BINANCE_METRICS_PORT")?.unwrap_or(0);

        Ok(Self {
            client,
            mode,
            channel_capacity,
            metrics_port,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn non_empty<F>(lookup: &F, key: &str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(key.to_string())),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

fn parse_env<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value,
                })
        })
        .transpose()
}

fn parse_u16<F>(lookup: &F, key: &str) -> Result<Option<u16>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_env(lookup, key)
}

fn parse_u64<F>(lookup: &F, key: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_env(lookup, key)
}

fn parse_usize<F>(lookup: &F, key: &str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_env(lookup, key)
}
