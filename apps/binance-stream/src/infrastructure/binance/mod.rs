//! Binance WebSocket Adapters
//!
//! Clients for Binance's push streams:
//!
//! - **Single**: One subscription per connection, raw payloads
//! - **Combined**: Several subscriptions, `{"stream", "data"}` envelope
//! - **User data**: Account events behind a listen key
//!
//! [`AggTradeStream`] layers typed aggregate trade delivery over a single
//! stream connection.

pub mod aggtrade;
pub mod codec;
pub mod connection;
pub mod messages;

pub use aggtrade::{AggTradeStream, AggTradeStreamEvent, StreamCloser};
pub use codec::{CodecError, CombinedStreamMessage, JsonCodec, decode_raw_stream_message};
pub use connection::{
    ConnectionError, DEFAULT_STREAM_URL, StreamClient, StreamClientConfig, StreamError,
};
pub use messages::*;
