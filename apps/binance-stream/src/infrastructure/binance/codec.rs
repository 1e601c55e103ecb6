//! Stream Codec Module
//!
//! Decodes Binance WebSocket frames into typed messages.
//!
//! - **Single streams** carry the raw payload: decode with the matching
//!   `decode_*` method.
//! - **Combined streams** wrap every payload in an envelope naming its
//!   subscription. The payload shape depends on the name, so the envelope is
//!   parsed shallowly first and the `data` field is materialized according to
//!   [`StreamKind`].
//!
//! # Combined Envelope
//!
//! ```json
//! {"stream":"btcusdt@aggTrade","data":{"e":"aggTrade",...}}
//! {"stream":"!ticker@arr","data":[{"e":"24hrTicker",...},...]}
//! ```

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::messages::{AggTrade, ExecutionReport, Ticker24h};
use crate::domain::subscription::StreamKind;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame has no `stream` envelope.
    #[error("not part of a combined stream")]
    NotCombinedStream,

    /// Invalid frame format.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),
}

// =============================================================================
// Combined Stream Message
// =============================================================================

/// A decoded combined-stream frame.
///
/// Exactly one payload is carried, selected by the subscription name.
#[derive(Debug, Clone, PartialEq)]
pub enum CombinedStreamMessage {
    /// `!ticker@arr` payload.
    Tickers {
        /// Subscription name.
        stream: String,
        /// One snapshot per symbol.
        tickers: Vec<Ticker24h>,
    },
    /// `<symbol>@aggTrade` payload.
    AggTrade {
        /// Subscription name.
        stream: String,
        /// The trade.
        trade: AggTrade,
    },
    /// Payload of a subscription this codec does not decode itself.
    Unknown {
        /// Subscription name.
        stream: String,
        /// The undecoded `data` field.
        data: serde_json::Value,
    },
}

impl CombinedStreamMessage {
    /// Subscription name the frame was published on.
    #[must_use]
    pub fn stream(&self) -> &str {
        match self {
            Self::Tickers { stream, .. }
            | Self::AggTrade { stream, .. }
            | Self::Unknown { stream, .. } => stream,
        }
    }

    /// Payload kind of this message.
    #[must_use]
    pub const fn kind(&self) -> StreamKind {
        match self {
            Self::Tickers { .. } => StreamKind::AllTickers,
            Self::AggTrade { .. } => StreamKind::AggTrade,
            Self::Unknown { .. } => StreamKind::Other,
        }
    }

    /// Decode an unknown payload into a caller-chosen type.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidFormat`] if the payload was already
    /// decoded by this codec, or a JSON error if it does not match `T`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        match self {
            Self::Unknown { data, .. } => Ok(T::deserialize(data)?),
            other => Err(CodecError::InvalidFormat(format!(
                "payload of {} is already typed",
                other.stream()
            ))),
        }
    }
}

/// Envelope parsed before the payload shape is known.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    stream: serde_json::Value,
    #[serde(default)]
    data: serde_json::Value,
}

// =============================================================================
// JSON Codec
// =============================================================================

/// JSON codec for Binance market and user data streams.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a combined-stream frame.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotCombinedStream`] if the frame is not a JSON
    /// object with a string `stream` field, or a JSON error if the payload
    /// does not match the shape its subscription name implies.
    pub fn decode_combined(&self, text: &str) -> Result<CombinedStreamMessage, CodecError> {
        let trimmed = text.trim_start();
        if !trimmed.starts_with('{') {
            return Err(CodecError::NotCombinedStream);
        }

        let envelope: Envelope = serde_json::from_str(trimmed)?;
        let serde_json::Value::String(stream) = envelope.stream else {
            return Err(CodecError::NotCombinedStream);
        };

        let message = match StreamKind::classify(&stream) {
            StreamKind::AllTickers => {
                let tickers: Vec<Ticker24h> = serde_json::from_value(envelope.data)?;
                CombinedStreamMessage::Tickers { stream, tickers }
            }
            StreamKind::AggTrade => {
                let trade: AggTrade = serde_json::from_value(envelope.data)?;
                CombinedStreamMessage::AggTrade { stream, trade }
            }
            StreamKind::Other => CombinedStreamMessage::Unknown {
                stream,
                data: envelope.data,
            },
        };

        Ok(message)
    }

    /// Decode a raw aggregate trade payload (single-stream frame).
    ///
    /// # Errors
    ///
    /// Returns an error if a field is missing or a decimal is malformed.
    pub fn decode_agg_trade(&self, text: &str) -> Result<AggTrade, CodecError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a raw 24h ticker payload (single-stream frame).
    ///
    /// # Errors
    ///
    /// Returns an error if a field is missing or a decimal is malformed.
    pub fn decode_ticker(&self, text: &str) -> Result<Ticker24h, CodecError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a user data stream order update.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is missing or a decimal is malformed.
    pub fn decode_execution_report(&self, text: &str) -> Result<ExecutionReport, CodecError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Decode a raw combined-stream frame from bytes.
///
/// # Errors
///
/// Returns [`CodecError::InvalidFormat`] for non-UTF-8 input, otherwise
/// the errors of [`JsonCodec::decode_combined`].
pub fn decode_raw_stream_message(bytes: &[u8]) -> Result<CombinedStreamMessage, CodecError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CodecError::InvalidFormat(format!("frame is not UTF-8: {e}")))?;
    JsonCodec::new().decode_combined(text)
}
