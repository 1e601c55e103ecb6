//! Infrastructure Layer - Adapters and external integrations.
//!
//! WebSocket transport, wire decoding and the process-level concerns
//! (configuration, logging, metrics) around them.

/// Binance WebSocket stream adapters.
pub mod binance;

/// Configuration loading.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Logging and OpenTelemetry tracing integration.
pub mod telemetry;
