#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Binance Stream - Market Data Push-Feed Client
//!
//! Opens Binance WebSocket streams, decodes their JSON frames into typed
//! events and forwards aggregate trades to a consumer channel.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Venue naming rules with no I/O
//!   - `subscription`: Stream names, payload kinds, URL paths
//!
//! - **Infrastructure**: Adapters and process concerns
//!   - `binance`: Connection manager, codec, wire types, trade distributor
//!   - `config`: Environment configuration
//!   - `metrics`: Prometheus counters
//!   - `telemetry`: Logging and OpenTelemetry tracing
//!
//! # Data Flow
//!
//! ```text
//! Binance WS ──► StreamClient ──► JsonCodec ──► AggTradeStream ──► mpsc ──► Consumer
//!   (frames)      (read loop)     (demux)       (distributor)
//!                                                    ▲
//!                                  StreamCloser ─────┘ (close from any task)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Subscription naming with no I/O.
pub mod domain;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::subscription::{StreamKind, StreamName};

// Binance stream client
pub use infrastructure::binance::{
    AggTrade, AggTradeStream, AggTradeStreamEvent, CodecError, CombinedStreamMessage,
    ConnectionError, ExecutionReport, JsonCodec, StreamClient, StreamClientConfig, StreamCloser,
    StreamError, Ticker24h,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, ListenKey, StreamConfig, StreamMode};

// Metrics
pub use infrastructure::metrics::{MetricsError, StreamType as MetricsStreamType, init_metrics};

// Telemetry
pub use infrastructure::telemetry::{
    TelemetryConfig, TelemetryError, TelemetryGuard, init as init_telemetry,
};
