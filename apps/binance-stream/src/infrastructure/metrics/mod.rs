//! Prometheus Metrics Module
//!
//! Counters for stream connections, frames and delivered events.
//!
//! # Metrics Categories
//!
//! - **Connections**: Opened and failed connection attempts by stream type
//! - **Frames**: Frames read and frames that failed to decode
//! - **Delivery**: Events handed to subscribers, close signals dropped
//!
//! # Integration
//!
//! The recording functions are cheap no-ops until [`init_metrics`] installs
//! the Prometheus recorder, which serves `/metrics` on its own listener.

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Metrics initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Prometheus exporter could not be built or installed.
    #[error("failed to install Prometheus exporter: {0}")]
    Install(#[from] BuildError),
}

/// Install the Prometheus recorder and HTTP listener on `port`.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the listener
/// cannot be bound.
pub fn init_metrics(port: u16) -> Result<(), MetricsError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    register_metrics();
    tracing::info!(%addr, "Prometheus metrics listener started");
    Ok(())
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "binance_stream_connections_total",
        "Stream connections opened, by stream type"
    );
    describe_counter!(
        "binance_stream_connection_failures_total",
        "Stream connection attempts that failed, by stream type"
    );
    describe_counter!(
        "binance_stream_frames_received_total",
        "Text frames read from Binance streams"
    );
    describe_counter!(
        "binance_stream_decode_errors_total",
        "Frames that could not be decoded"
    );
    describe_counter!(
        "binance_stream_events_delivered_total",
        "Trade events delivered to subscribers"
    );
    describe_counter!(
        "binance_stream_close_signals_dropped_total",
        "Close signals dropped because the subscriber was not ready"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for stream connection types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    /// `ws/<name>` connection.
    Single,
    /// `stream?streams=...` connection.
    Combined,
    /// `ws/<listenKey>` connection.
    User,
}

impl StreamType {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Combined => "combined",
            Self::User => "user",
        }
    }
}

/// Record a successfully opened connection.
pub fn record_connection_opened(stream_type: StreamType) {
    counter!(
        "binance_stream_connections_total",
        "stream_type" => stream_type.as_str()
    )
    .increment(1);
}

/// Record a failed connection attempt.
pub fn record_connection_failed(stream_type: StreamType) {
    counter!(
        "binance_stream_connection_failures_total",
        "stream_type" => stream_type.as_str()
    )
    .increment(1);
}

/// Record a text frame read from a stream.
pub fn record_frame_received(stream_type: StreamType) {
    counter!(
        "binance_stream_frames_received_total",
        "stream_type" => stream_type.as_str()
    )
    .increment(1);
}

/// Record a frame that failed to decode.
pub fn record_decode_error(stream_type: StreamType) {
    counter!(
        "binance_stream_decode_errors_total",
        "stream_type" => stream_type.as_str()
    )
    .increment(1);
}

/// Record a trade event delivered to a subscriber.
pub fn record_event_delivered() {
    counter!("binance_stream_events_delivered_total").increment(1);
}

/// Record a close signal that was dropped.
pub fn record_close_signal_dropped() {
    counter!("binance_stream_close_signals_dropped_total").increment(1);
}

// =============================================================================
// Tests
// =============================================================================
