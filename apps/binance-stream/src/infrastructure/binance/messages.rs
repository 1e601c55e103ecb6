//! Binance WebSocket Message Types
//!
//! Wire format types for the payloads Binance pushes over its streams.
//! Prices and quantities arrive as decimal text and are parsed with
//! `rust_decimal`; identifiers, flags and epoch-millisecond times arrive as
//! native JSON values.
//!
//! # Message Types
//!
//! ## Market Streams
//! - `AggTrade`: `<symbol>@aggTrade`
//! - `Ticker24h`: `<symbol>@ticker`, and arrays of them on `!ticker@arr`
//!
//! ## User Data Stream
//! - `ExecutionReport`: order lifecycle events
//!
//! # References
//!
//! - [WebSocket Streams](https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams)
//! - [User Data Streams](https://developers.binance.com/docs/binance-spot-api-docs/user-data-stream)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Convert an epoch-millisecond field to a UTC instant.
fn millis_to_utc(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

// =============================================================================
// Aggregate Trade
// =============================================================================

/// Aggregate trade: one or more fills at the same price from one taker order.
///
/// # Wire Format (JSON)
/// ```json
/// {"e":"aggTrade","E":1525367516316,"s":"BTCUSDT","a":1,"p":"0.01000000",
///  "q":"100.00000000","f":1,"l":1,"T":1525367516312,"m":false,"M":false}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggTrade {
    /// Event type (always "aggTrade")
    #[serde(rename = "e")]
    pub event_type: String,

    /// Event time (epoch ms)
    #[serde(rename = "E")]
    pub event_time: i64,

    /// Symbol (e.g. "BTCUSDT")
    #[serde(rename = "s")]
    pub symbol: String,

    /// Aggregate trade ID
    #[serde(rename = "a")]
    pub agg_trade_id: i64,

    /// Price
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price: Decimal,

    /// Quantity
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quantity: Decimal,

    /// First underlying trade ID
    #[serde(rename = "f")]
    pub first_trade_id: i64,

    /// Last underlying trade ID
    #[serde(rename = "l")]
    pub last_trade_id: i64,

    /// Trade time (epoch ms)
    #[serde(rename = "T")]
    pub trade_time: i64,

    /// Whether the buyer was the maker
    #[serde(rename = "m")]
    pub buyer_is_maker: bool,

    /// Whether the trade was the best price match (deprecated by the venue)
    #[serde(rename = "M", default)]
    pub best_match: bool,
}

impl AggTrade {
    /// Notional value in the quote asset (`price * quantity`).
    #[must_use]
    pub fn quote_quantity(&self) -> Decimal {
        self.price * self.quantity
    }

    /// Trade time as a UTC instant.
    ///
    /// Returns `None` only for millisecond values outside chrono's range.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.trade_time)
    }

    /// Event time as a UTC instant.
    #[must_use]
    pub fn event_timestamp(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.event_time)
    }
}

// =============================================================================
// 24h Ticker
// =============================================================================

/// Rolling 24-hour statistics for one symbol.
///
/// # Wire Format (JSON)
/// ```json
/// {"e":"24hrTicker","E":123456789,"s":"BNBBTC","p":"0.0015","P":"250.00",
///  "w":"0.0018","x":"0.0009","c":"0.0025","Q":"10","b":"0.0024","B":"10",
///  "a":"0.0026","A":"100","o":"0.0010","h":"0.0025","l":"0.0010",
///  "v":"10000","q":"18","O":0,"C":86400000,"F":0,"L":18150,"n":18151}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker24h {
    /// Event type (always "24hrTicker")
    #[serde(rename = "e")]
    pub event_type: String,

    /// Event time (epoch ms)
    #[serde(rename = "E")]
    pub event_time: i64,

    /// Symbol
    #[serde(rename = "s")]
    pub symbol: String,

    /// Absolute price change
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price_change: Decimal,

    /// Price change percent
    #[serde(rename = "P", with = "rust_decimal::serde::str")]
    pub price_change_percent: Decimal,

    /// Weighted average price
    #[serde(rename = "w", with = "rust_decimal::serde::str")]
    pub weighted_average_price: Decimal,

    /// Previous day's close price
    #[serde(rename = "x", with = "rust_decimal::serde::str")]
    pub previous_close: Decimal,

    /// Last (current day close) price
    #[serde(rename = "c", with = "rust_decimal::serde::str")]
    pub last_price: Decimal,

    /// Last trade quantity
    #[serde(rename = "Q", with = "rust_decimal::serde::str")]
    pub last_quantity: Decimal,

    /// Best bid price
    #[serde(rename = "b", with = "rust_decimal::serde::str")]
    pub bid_price: Decimal,

    /// Best bid quantity
    #[serde(rename = "B", with = "rust_decimal::serde::str")]
    pub bid_quantity: Decimal,

    /// Best ask price
    #[serde(rename = "a", with = "rust_decimal::serde::str")]
    pub ask_price: Decimal,

    /// Best ask quantity
    #[serde(rename = "A", with = "rust_decimal::serde::str")]
    pub ask_quantity: Decimal,

    /// Open price
    #[serde(rename = "o", with = "rust_decimal::serde::str")]
    pub open_price: Decimal,

    /// High price
    #[serde(rename = "h", with = "rust_decimal::serde::str")]
    pub high_price: Decimal,

    /// Low price
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub low_price: Decimal,

    /// Total traded base asset volume
    #[serde(rename = "v", with = "rust_decimal::serde::str")]
    pub base_volume: Decimal,

    /// Total traded quote asset volume
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,

    /// Statistics open time (epoch ms)
    #[serde(rename = "O")]
    pub open_time: i64,

    /// Statistics close time (epoch ms)
    #[serde(rename = "C")]
    pub close_time: i64,

    /// First trade ID in the window
    #[serde(rename = "F")]
    pub first_trade_id: i64,

    /// Last trade ID in the window
    #[serde(rename = "L")]
    pub last_trade_id: i64,

    /// Number of trades in the window
    #[serde(rename = "n")]
    pub trade_count: i64,
}

impl Ticker24h {
    /// Event time as a UTC instant.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.event_time)
    }
}

// =============================================================================
// User Data Stream
// =============================================================================

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy
    Buy,
    /// Sell
    Sell,
}

/// What happened to the order in this report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    /// Order accepted by the engine
    New,
    /// Order canceled by the user
    Canceled,
    /// Order replaced (unused by spot)
    Replaced,
    /// Order rejected
    Rejected,
    /// Part or all of the order filled
    Trade,
    /// Order expired
    Expired,
    /// Execution type not known to this client
    #[serde(other)]
    Other,
}

/// Order status after this report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted, nothing filled
    New,
    /// Some quantity filled
    PartiallyFilled,
    /// Fully filled
    Filled,
    /// Canceled
    Canceled,
    /// Cancel in progress
    PendingCancel,
    /// Rejected
    Rejected,
    /// Expired
    Expired,
    /// Status not known to this client
    #[serde(other)]
    Other,
}

/// Order update pushed on the user data stream.
///
/// # Wire Format (JSON)
/// ```json
/// {"e":"executionReport","E":1525367516316,"s":"ETHBTC","c":"ixN5efEm67zwRm3Ts8NL3R",
///  "S":"SELL","o":"MARKET","f":"GTC","q":"0.02900000","p":"0.00000000",...}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Event type (always "executionReport")
    #[serde(rename = "e")]
    pub event_type: String,

    /// Event time (epoch ms)
    #[serde(rename = "E")]
    pub event_time: i64,

    /// Symbol
    #[serde(rename = "s")]
    pub symbol: String,

    /// Client order ID
    #[serde(rename = "c")]
    pub client_order_id: String,

    /// Side
    #[serde(rename = "S")]
    pub side: OrderSide,

    /// Order type (LIMIT, MARKET, ...)
    #[serde(rename = "o")]
    pub order_type: String,

    /// Time in force (GTC, IOC, FOK)
    #[serde(rename = "f")]
    pub time_in_force: String,

    /// Order quantity
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quantity: Decimal,

    /// Order price
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price: Decimal,

    /// Stop price
    #[serde(rename = "P", with = "rust_decimal::serde::str")]
    pub stop_price: Decimal,

    /// Iceberg quantity
    #[serde(rename = "F", with = "rust_decimal::serde::str")]
    pub iceberg_quantity: Decimal,

    /// Original client order ID of the order being canceled
    #[serde(rename = "C", default)]
    pub original_client_order_id: Option<String>,

    /// Execution type
    #[serde(rename = "x")]
    pub execution_type: ExecutionType,

    /// Order status
    #[serde(rename = "X")]
    pub order_status: OrderStatus,

    /// Reject reason ("NONE" when not rejected)
    #[serde(rename = "r")]
    pub reject_reason: String,

    /// Order ID
    #[serde(rename = "i")]
    pub order_id: i64,

    /// Quantity filled by this execution
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub last_executed_quantity: Decimal,

    /// Cumulative filled quantity
    #[serde(rename = "z", with = "rust_decimal::serde::str")]
    pub cumulative_filled_quantity: Decimal,

    /// Price of this execution
    #[serde(rename = "L", with = "rust_decimal::serde::str")]
    pub last_executed_price: Decimal,

    /// Commission charged for this execution
    #[serde(rename = "n", with = "rust_decimal::serde::str")]
    pub commission: Decimal,

    /// Commission asset (null until the first fill)
    #[serde(rename = "N", default)]
    pub commission_asset: Option<String>,

    /// Transaction time (epoch ms)
    #[serde(rename = "T")]
    pub transaction_time: i64,

    /// Trade ID (-1 when no fill)
    #[serde(rename = "t")]
    pub trade_id: i64,

    /// Whether the order is on the book
    #[serde(rename = "w")]
    pub is_working: bool,

    /// Whether this fill was on the maker side
    #[serde(rename = "m")]
    pub is_maker: bool,

    /// Order creation time (epoch ms, -1 when absent)
    #[serde(rename = "O", default)]
    pub order_creation_time: i64,

    /// Cumulative quote asset transacted quantity
    #[serde(rename = "Z", with = "rust_decimal::serde::str")]
    pub cumulative_quote_quantity: Decimal,
}

impl ExecutionReport {
    /// Transaction time as a UTC instant.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.transaction_time)
    }

    /// Whether this report carries a fill.
    #[must_use]
    pub const fn is_fill(&self) -> bool {
        matches!(self.execution_type, ExecutionType::Trade)
    }
}
