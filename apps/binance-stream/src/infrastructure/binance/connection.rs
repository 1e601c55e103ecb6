//! Stream Connection Manager
//!
//! Opens and tears down one WebSocket connection to Binance's market data
//! host for a path built from one or more subscription names.
//!
//! # Stream URLs
//!
//! - Single: `wss://stream.binance.com:9443/ws/<name>`
//! - Combined: `wss://stream.binance.com:9443/stream?streams=<a>/<b>`
//! - User data: `wss://stream.binance.com:9443/ws/<listenKey>`
//!
//! There is no reconnection here. A failed read is reported to the caller,
//! who decides whether to open a fresh connection.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::codec::{CodecError, CombinedStreamMessage, JsonCodec};
use crate::domain::subscription::{StreamName, combined_stream_path, user_stream_path};
use crate::infrastructure::metrics::{self, StreamType};

/// Binance spot market data host.
pub const DEFAULT_STREAM_URL: &str = "wss://stream.binance.com:9443";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// Error Types
// =============================================================================

/// Errors opening a stream. No connection exists when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Server answered the upgrade request with a non-101 status.
    #[error("handshake rejected: {0}")]
    UnexpectedStatus(String),

    /// DNS, TCP, TLS or protocol failure while connecting.
    #[error("WebSocket connection failed: {0}")]
    Transport(#[source] tungstenite::Error),
}

/// Errors reading or decoding frames from an open stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Remote closed the connection or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// Local close was requested while reading.
    #[error("stream close requested")]
    CloseRequested,

    /// No frame arrived within the configured read timeout.
    #[error("no frame received within {0:?}")]
    ReadTimeout(Duration),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration shared by every stream connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamClientConfig {
    /// Base WebSocket URL, without trailing path.
    pub base_url: String,
    /// Upper bound on a single blocking read (`None` waits forever).
    pub read_timeout: Option<Duration>,
}

impl Default for StreamClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STREAM_URL.to_string(),
            read_timeout: None,
        }
    }
}

impl StreamClientConfig {
    /// Create a configuration for a custom host.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            read_timeout: None,
        }
    }

    /// Set the read timeout.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Full URL for a stream path.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

// =============================================================================
// Stream Client
// =============================================================================

/// One open WebSocket connection to a Binance stream.
///
/// Reads must come from a single task; the handle is not meant to be shared.
pub struct StreamClient {
    ws: WsStream,
    codec: JsonCodec,
    stream_type: StreamType,
    read_timeout: Option<Duration>,
    closed: bool,
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("stream_type", &self.stream_type)
            .field("read_timeout", &self.read_timeout)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl StreamClient {
    /// Open a connection carrying exactly one subscription (`ws/<name>`).
    ///
    /// The name is used as given; callers normalize it beforehand.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if the handshake fails.
    pub async fn open_single_stream(
        config: &StreamClientConfig,
        name: &StreamName,
    ) -> Result<Self, ConnectionError> {
        let path = name.single_stream_path();
        Self::open(config, &path, &path, StreamType::Single).await
    }

    /// Open a combined-stream connection (`stream?streams=<a>/<b>/...`).
    ///
    /// Every frame on this connection is wrapped in the combined envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if the handshake fails.
    pub async fn connect(
        config: &StreamClientConfig,
        names: &[StreamName],
    ) -> Result<Self, ConnectionError> {
        let path = combined_stream_path(names);
        Self::open(config, &path, &path, StreamType::Combined).await
    }

    /// Open the private user data stream authorised by `listen_key`.
    ///
    /// Obtaining and keeping the listen key alive is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if the handshake fails.
    pub async fn open_user_stream(
        config: &StreamClientConfig,
        listen_key: &str,
    ) -> Result<Self, ConnectionError> {
        let path = user_stream_path(listen_key);
        Self::open(config, &path, "ws/[REDACTED]", StreamType::User).await
    }

    async fn open(
        config: &StreamClientConfig,
        path: &str,
        log_path: &str,
        stream_type: StreamType,
    ) -> Result<Self, ConnectionError> {
        let url = config.url_for(path);
        tracing::info!(
            base_url = %config.base_url,
            path = log_path,
            stream_type = stream_type.as_str(),
            "Connecting to Binance stream"
        );

        let result = tokio_tungstenite::connect_async(url.as_str()).await;
        let (ws, response) = match result {
            Ok(connected) => connected,
            Err(tungstenite::Error::Http(response)) => {
                metrics::record_connection_failed(stream_type);
                let status = status_line(response.status());
                tracing::warn!(status = %status, path = log_path, "Stream handshake rejected");
                return Err(ConnectionError::UnexpectedStatus(status));
            }
            Err(e) => {
                metrics::record_connection_failed(stream_type);
                tracing::warn!(error = %e, path = log_path, "Stream connection failed");
                return Err(ConnectionError::Transport(e));
            }
        };

        if response.status() != StatusCode::SWITCHING_PROTOCOLS {
            metrics::record_connection_failed(stream_type);
            return Err(ConnectionError::UnexpectedStatus(status_line(
                response.status(),
            )));
        }

        metrics::record_connection_opened(stream_type);
        tracing::debug!(path = log_path, "Stream connected");

        Ok(Self {
            ws,
            codec: JsonCodec::new(),
            stream_type,
            read_timeout: config.read_timeout,
            closed: false,
        })
    }

    /// Read the next text frame.
    ///
    /// Ping and pong frames are consumed here; the WebSocket layer answers
    /// pings on the next read. Binary frames are accepted if they hold UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::ConnectionClosed`] when the remote closes,
    /// [`StreamError::ReadTimeout`] when a configured deadline passes, or the
    /// underlying WebSocket error.
    pub async fn next_frame(&mut self) -> Result<String, StreamError> {
        loop {
            let next = match self.read_timeout {
                Some(limit) => tokio::time::timeout(limit, self.ws.next())
                    .await
                    .map_err(|_| StreamError::ReadTimeout(limit))?,
                None => self.ws.next().await,
            };

            match next {
                Some(Ok(Message::Text(text))) => {
                    metrics::record_frame_received(self.stream_type);
                    return Ok(text.as_str().to_owned());
                }
                Some(Ok(Message::Binary(data))) => {
                    metrics::record_frame_received(self.stream_type);
                    return String::from_utf8(data.to_vec()).map_err(|e| {
                        CodecError::InvalidFormat(format!("binary frame is not UTF-8: {e}"))
                            .into()
                    });
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(frame = ?frame, "Server sent close frame");
                    self.closed = true;
                    return Err(StreamError::ConnectionClosed);
                }
                Some(Ok(_)) => {
                    // Ping, pong and raw frames carry no payload for us
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    tracing::info!("WebSocket stream ended");
                    self.closed = true;
                    return Err(StreamError::ConnectionClosed);
                }
            }
        }
    }

    /// Read and decode the next combined-stream frame.
    ///
    /// # Errors
    ///
    /// Returns read errors from [`Self::next_frame`] or codec errors.
    pub async fn next_message(&mut self) -> Result<CombinedStreamMessage, StreamError> {
        let frame = self.next_frame().await?;
        self.codec.decode_combined(&frame).map_err(|e| {
            metrics::record_decode_error(self.stream_type);
            e.into()
        })
    }

    /// Read the next frame as an untyped JSON value.
    ///
    /// # Errors
    ///
    /// Returns read errors from [`Self::next_frame`] or a JSON codec error.
    pub async fn next_json(&mut self) -> Result<serde_json::Value, StreamError> {
        let frame = self.next_frame().await?;
        serde_json::from_str(&frame).map_err(|e| {
            metrics::record_decode_error(self.stream_type);
            CodecError::from(e).into()
        })
    }

    /// Stream type label of this connection.
    #[must_use]
    pub const fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    /// Close the connection.
    ///
    /// Errors from the close handshake are logged and otherwise ignored.
    /// Calling this on an already closed connection does nothing.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.ws.close(None).await {
            tracing::debug!(error = %e, "Ignoring error while closing stream");
        }
    }
}

/// Render a status the way it appears on the HTTP status line.
fn status_line(status: StatusCode) -> String {
    status.canonical_reason().map_or_else(
        || status.as_u16().to_string(),
        |reason| format!("{} {reason}", status.as_u16()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_binance() {
        let config = StreamClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_STREAM_URL);
        assert_eq!(config.read_timeout, None);
    }

    #[test]
    fn url_for_joins_base_and_path() {
        let config = StreamClientConfig::default();
        assert_eq!(
            config.url_for("ws/btcusdt@aggTrade"),
            "wss://stream.binance.com:9443/ws/btcusdt@aggTrade"
        );

        let config = StreamClientConfig::new("ws://127.0.0.1:9000/");
        assert_eq!(
            config.url_for("stream?streams=!ticker@arr"),
            "ws://127.0.0.1:9000/stream?streams=!ticker@arr"
        );
    }

    #[test]
    fn read_timeout_builder() {
        let config = StreamClientConfig::default().with_read_timeout(Duration::from_secs(5));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn status_line_includes_reason() {
        assert_eq!(status_line(StatusCode::FORBIDDEN), "403 Forbidden");
        assert_eq!(status_line(StatusCode::OK), "200 OK");
        assert_eq!(status_line(StatusCode::from_u16(599).unwrap()), "599");
    }

    #[test]
    fn connection_error_carries_status_text() {
        let err = ConnectionError::UnexpectedStatus("403 Forbidden".to_string());
        assert_eq!(err.to_string(), "handshake rejected: 403 Forbidden");
    }
}
