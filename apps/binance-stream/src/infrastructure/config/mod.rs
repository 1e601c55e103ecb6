//! Configuration Module
//!
//! Configuration loading for the stream client.

mod settings;

pub use settings::{
    ConfigError, DEFAULT_CHANNEL_CAPACITY, DEFAULT_SYMBOL, ListenKey, StreamConfig, StreamMode,
};
