//! Aggregate Trade Distributor
//!
//! Wraps a single-stream `<symbol>@aggTrade` connection and fans its
//! decoded trades out to one subscriber over a bounded channel.
//!
//! # Delivery Rules
//!
//! - Every decoded trade is delivered in arrival order, waiting for channel
//!   capacity (back-pressure reaches the socket read). A close requested
//!   during that wait takes effect on the next read, never dropping the trade.
//! - The first read or decode failure ends the loop. If a close was
//!   requested the subscriber gets at most one [`AggTradeStreamEvent::Closed`],
//!   sent without waiting and dropped if the channel is full. Otherwise the
//!   subscriber gets exactly one [`AggTradeStreamEvent::Error`].
//! - The channel is closed after the loop ends, so a subscriber always
//!   observes the end of the stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::codec::JsonCodec;
use super::connection::{ConnectionError, StreamClient, StreamClientConfig, StreamError};
use super::messages::AggTrade;
use crate::domain::subscription::StreamName;
use crate::infrastructure::metrics;

/// Event delivered to an aggregate trade subscriber.
#[derive(Debug)]
pub enum AggTradeStreamEvent {
    /// A decoded trade.
    Trade(AggTrade),
    /// The stream failed without a close being requested.
    Error(StreamError),
    /// The stream ended because a close was requested.
    Closed,
}

#[derive(Debug, Default)]
struct CloseSignal {
    requested: AtomicBool,
    token: CancellationToken,
}

impl CloseSignal {
    fn request(&self) {
        // Flag before cancel: whoever wakes on the token must see the flag.
        self.requested.store(true, Ordering::Release);
        self.token.cancel();
    }

    fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// Cloneable handle that closes an [`AggTradeStream`] from another task.
#[derive(Debug, Clone)]
pub struct StreamCloser {
    signal: Arc<CloseSignal>,
}

impl StreamCloser {
    /// Request the stream to close. Idempotent.
    ///
    /// A read blocked on the socket is interrupted and the subscribe loop
    /// releases the connection; the subscriber then sees at most one
    /// `Closed` event followed by the end of the channel.
    pub fn close(&self) {
        self.signal.request();
    }

    /// Whether a close has been requested.
    #[must_use]
    pub fn is_close_requested(&self) -> bool {
        self.signal.is_requested()
    }
}

/// Typed aggregate trade stream for one symbol.
#[derive(Debug)]
pub struct AggTradeStream {
    client: StreamClient,
    codec: JsonCodec,
    signal: Arc<CloseSignal>,
    name: StreamName,
}

impl AggTradeStream {
    /// Open `ws/<symbol>@aggTrade`; the symbol is lower-cased.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if the handshake fails.
    pub async fn open(config: &StreamClientConfig, symbol: &str) -> Result<Self, ConnectionError> {
        let name = StreamName::agg_trade(symbol);
        let client = StreamClient::open_single_stream(config, &name).await?;
        Ok(Self::from_client(client, name))
    }

    /// Wrap an already open single-stream connection.
    #[must_use]
    pub fn from_client(client: StreamClient, name: StreamName) -> Self {
        Self {
            client,
            codec: JsonCodec::new(),
            signal: Arc::new(CloseSignal::default()),
            name,
        }
    }

    /// Subscription name this stream reads.
    #[must_use]
    pub const fn name(&self) -> &StreamName {
        &self.name
    }

    /// Handle for closing this stream from elsewhere.
    #[must_use]
    pub fn closer(&self) -> StreamCloser {
        StreamCloser {
            signal: Arc::clone(&self.signal),
        }
    }

    /// Close this stream and release its connection.
    ///
    /// Later reads return [`StreamError::CloseRequested`].
    pub async fn close(&mut self) {
        self.signal.request();
        self.client.close().await;
    }

    /// Read and decode the next trade.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::CloseRequested`] once a close was requested,
    /// otherwise the read or decode failure.
    pub async fn next(&mut self) -> Result<AggTrade, StreamError> {
        if self.signal.is_requested() {
            return Err(StreamError::CloseRequested);
        }

        let frame = tokio::select! {
            biased;
            () = self.signal.token.cancelled() => return Err(StreamError::CloseRequested),
            frame = self.client.next_frame() => frame?,
        };

        self.codec.decode_agg_trade(&frame).map_err(|e| {
            metrics::record_decode_error(self.client.stream_type());
            e.into()
        })
    }

    /// Deliver trades to `tx` until the stream fails or is closed.
    ///
    /// The connection is closed and `tx` dropped before this returns.
    pub async fn subscribe(mut self, tx: mpsc::Sender<AggTradeStreamEvent>) {
        tracing::info!(stream = %self.name, "Aggregate trade subscription started");

        loop {
            let err = match self.next().await {
                Ok(trade) => {
                    if tx.send(AggTradeStreamEvent::Trade(trade)).await.is_err() {
                        tracing::debug!(stream = %self.name, "Subscriber dropped, stopping");
                        break;
                    }
                    metrics::record_event_delivered();
                    continue;
                }
                Err(e) => e,
            };

            if self.signal.is_requested() {
                if tx.try_send(AggTradeStreamEvent::Closed).is_err() {
                    metrics::record_close_signal_dropped();
                    tracing::debug!(stream = %self.name, "Subscriber not ready, close signal dropped");
                }
            } else {
                tracing::warn!(stream = %self.name, error = %err, "Aggregate trade stream failed");
                if tx.send(AggTradeStreamEvent::Error(err)).await.is_err() {
                    tracing::debug!(stream = %self.name, "Subscriber dropped before error delivery");
                }
            }
            break;
        }

        self.client.close().await;
        tracing::info!(stream = %self.name, "Aggregate trade subscription ended");
    }

    /// Run [`Self::subscribe`] on a new task.
    pub fn spawn(self, tx: mpsc::Sender<AggTradeStreamEvent>) -> JoinHandle<()> {
        tokio::spawn(self.subscribe(tx))
    }
}
