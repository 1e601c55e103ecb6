//! Binance Stream Binary
//!
//! Connects to one Binance stream and logs the decoded events.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin binance-stream
//! ```
//!
//! # Environment Variables
//!
//! - `BINANCE_STREAM_URL`: Stream host (default: wss://stream.binance.com:9443)
//! - `BINANCE_SYMBOL`: Aggregate trade symbol (default: BTCUSDT)
//! - `BINANCE_STREAMS`: Comma separated combined stream names (overrides symbol)
//! - `BINANCE_LISTEN_KEY`: User data stream listen key (overrides symbol)
//! - `BINANCE_READ_TIMEOUT_SECS`: Per-read deadline, 0 = none (default: 0)
//! - `BINANCE_CHANNEL_CAPACITY`: Trade channel capacity (default: 1024)
//! - `BINANCE_METRICS_PORT`: Prometheus metrics port, 0 = disabled (default: 0)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log level (default: info)

use anyhow::Context;
use binance_stream::infrastructure::binance::{
    AggTradeStream, AggTradeStreamEvent, CombinedStreamMessage, StreamClient, StreamError,
};
use binance_stream::infrastructure::telemetry;
use binance_stream::{StreamConfig, StreamMode, init_metrics};
use tokio::signal;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("failed to install rustls crypto provider");
    }

    load_dotenv();

    let _telemetry_guard = telemetry::init().context("failed to initialize telemetry")?;

    tracing::info!("Starting Binance stream client");

    let config = StreamConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    if config.metrics_port != 0 {
        init_metrics(config.metrics_port)?;
    }

    match &config.mode {
        StreamMode::AggTrade { symbol } => run_agg_trades(&config, symbol).await?,
        StreamMode::Combined(names) => {
            let client = StreamClient::connect(&config.client, names).await?;
            run_combined(client).await;
        }
        StreamMode::User(key) => {
            let client = StreamClient::open_user_stream(&config.client, key.expose()).await?;
            run_user(client).await;
        }
    }

    tracing::info!("Binance stream client stopped");
    Ok(())
}

/// Distribute aggregate trades until the stream ends or a shutdown arrives.
async fn run_agg_trades(config: &StreamConfig, symbol: &str) -> anyhow::Result<()> {
    let stream = AggTradeStream::open(&config.client, symbol).await?;
    let closer = stream.closer();
    let (tx, mut rx) = mpsc::channel(config.channel_capacity);
    let handle = stream.spawn(tx);

    tokio::spawn(async move {
        shutdown_signal().await;
        closer.close();
    });

    while let Some(event) = rx.recv().await {
        match event {
            AggTradeStreamEvent::Trade(trade) => {
                tracing::info!(
                    symbol = %trade.symbol,
                    agg_trade_id = trade.agg_trade_id,
                    price = %trade.price,
                    quantity = %trade.quantity,
                    buyer_is_maker = trade.buyer_is_maker,
                    "Aggregate trade"
                );
            }
            AggTradeStreamEvent::Error(e) => {
                tracing::error!(error = %e, "Aggregate trade stream failed");
            }
            AggTradeStreamEvent::Closed => {
                tracing::info!("Aggregate trade stream closed");
            }
        }
    }

    handle.await.context("aggregate trade task panicked")?;
    Ok(())
}

/// Log combined stream messages until the stream ends or a shutdown arrives.
async fn run_combined(mut client: StreamClient) {
    let read_loop = async {
        loop {
            match client.next_message().await {
                Ok(CombinedStreamMessage::Tickers { stream, tickers }) => {
                    tracing::info!(stream = %stream, count = tickers.len(), "Ticker snapshot");
                }
                Ok(CombinedStreamMessage::AggTrade { stream, trade }) => {
                    tracing::info!(
                        stream = %stream,
                        price = %trade.price,
                        quantity = %trade.quantity,
                        "Aggregate trade"
                    );
                }
                Ok(CombinedStreamMessage::Unknown { stream, .. }) => {
                    tracing::debug!(stream = %stream, "Unhandled stream payload");
                }
                Err(e) => {
                    log_stream_end(&e);
                    break;
                }
            }
        }
    };

    tokio::select! {
        () = read_loop => {}
        () = shutdown_signal() => {}
    }

    client.close().await;
}

/// Log user data events until the stream ends or a shutdown arrives.
async fn run_user(mut client: StreamClient) {
    let read_loop = async {
        loop {
            match client.next_json().await {
                Ok(value) => {
                    let event_type = value
                        .get("e")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("unknown")
                        .to_owned();
                    tracing::info!(event_type = %event_type, "User data event");
                }
                Err(e) => {
                    log_stream_end(&e);
                    break;
                }
            }
        }
    };

    tokio::select! {
        () = read_loop => {}
        () = shutdown_signal() => {}
    }

    client.close().await;
}

fn log_stream_end(error: &StreamError) {
    match error {
        StreamError::ConnectionClosed => tracing::info!("Stream closed by server"),
        other => tracing::error!(error = %other, "Stream failed"),
    }
}

/// Log the parsed configuration.
fn log_config(config: &StreamConfig) {
    tracing::info!(
        base_url = %config.client.base_url,
        mode = config.mode.as_str(),
        read_timeout = ?config.client.read_timeout,
        channel_capacity = config.channel_capacity,
        metrics_port = config.metrics_port,
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, closing stream");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, closing stream");
        }
    }
}
