//! Stream Subscription Names
//!
//! Domain types for Binance push-feed subscription names and the URL paths
//! that carry them.
//!
//! # Path Forms
//!
//! - Single stream: `ws/<name>` (raw payloads, no envelope)
//! - Combined stream: `stream?streams=<name1>/<name2>/...` (every payload is
//!   wrapped in `{"stream": "<name>", "data": ...}`)
//!
//! Symbols are lower-cased by the constructors here. Names passed through
//! [`StreamName::new`] are used verbatim.

use std::fmt;

// =============================================================================
// Constants
// =============================================================================

/// Subscription name of the all-symbols 24h ticker broadcast.
pub const ALL_TICKERS_STREAM: &str = "!ticker@arr";

/// Suffix carried by every per-symbol aggregate trade subscription.
pub const AGG_TRADE_SUFFIX: &str = "@aggTrade";

/// Suffix carried by every per-symbol 24h ticker subscription.
pub const TICKER_SUFFIX: &str = "@ticker";

// =============================================================================
// Stream Kind
// =============================================================================

/// Payload shape implied by a subscription name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// `!ticker@arr`: array of 24h ticker snapshots.
    AllTickers,
    /// `<symbol>@aggTrade`: a single aggregate trade.
    AggTrade,
    /// Any other subscription; payload left to the caller.
    Other,
}

impl StreamKind {
    /// Classify a subscription name.
    ///
    /// Matching is exact and case-sensitive: Binance echoes the name as
    /// `<symbol>@aggTrade`, so `btcusdt@aggtrade` is left to the caller.
    #[must_use]
    pub fn classify(name: &str) -> Self {
        if name == ALL_TICKERS_STREAM {
            Self::AllTickers
        } else if name.ends_with(AGG_TRADE_SUFFIX) {
            Self::AggTrade
        } else {
            Self::Other
        }
    }
}

// =============================================================================
// Stream Name
// =============================================================================

/// A venue-defined subscription name (e.g. `btcusdt@aggTrade`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamName(String);

impl StreamName {
    /// Wrap an already-normalized subscription name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Aggregate trade stream for a symbol.
    #[must_use]
    pub fn agg_trade(symbol: &str) -> Self {
        Self(format!("{}{AGG_TRADE_SUFFIX}", symbol.to_lowercase()))
    }

    /// 24h rolling ticker stream for a symbol.
    #[must_use]
    pub fn ticker(symbol: &str) -> Self {
        Self(format!("{}{TICKER_SUFFIX}", symbol.to_lowercase()))
    }

    /// All-symbols 24h ticker broadcast.
    #[must_use]
    pub fn all_tickers() -> Self {
        Self(ALL_TICKERS_STREAM.to_string())
    }

    /// Borrow the raw name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Payload shape this subscription carries.
    #[must_use]
    pub fn kind(&self) -> StreamKind {
        StreamKind::classify(&self.0)
    }

    /// Path for a single-stream connection carrying this subscription.
    #[must_use]
    pub fn single_stream_path(&self) -> String {
        format!("ws/{}", self.0)
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StreamName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for StreamName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Path for a combined-stream connection carrying every given subscription.
///
/// An empty slice produces `stream?streams=`, which the venue rejects or
/// serves nothing on; it is not treated as an error here.
#[must_use]
pub fn combined_stream_path(names: &[StreamName]) -> String {
    let joined = names
        .iter()
        .map(StreamName::as_str)
        .collect::<Vec<_>>()
        .join("/");
    format!("stream?streams={joined}")
}

/// Path for a user data stream authorised by `listen_key`.
#[must_use]
pub fn user_stream_path(listen_key: &str) -> String {
    format!("ws/{listen_key}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("!ticker@arr", StreamKind::AllTickers ; "all tickers")]
    #[test_case("btcusdt@aggTrade", StreamKind::AggTrade ; "venue casing")]
    #[test_case("btcusdt@aggtrade", StreamKind::Other ; "lower casing")]
    #[test_case("BTCUSDT@AGGTRADE", StreamKind::Other ; "upper casing")]
    #[test_case("btcusdt@ticker", StreamKind::Other ; "single ticker")]
    #[test_case("!ticker@arr2", StreamKind::Other ; "near miss")]
    #[test_case("", StreamKind::Other ; "empty")]
    #[test_case("@aggTrade", StreamKind::AggTrade ; "bare suffix")]
    fn classify_names(name: &str, expected: StreamKind) {
        assert_eq!(StreamKind::classify(name), expected);
    }

    #[test]
    fn classify_multibyte_name_does_not_panic() {
        assert_eq!(StreamKind::classify("ü@aggTradé"), StreamKind::Other);
    }

    #[test]
    fn agg_trade_name_lowercases_symbol() {
        let name = StreamName::agg_trade("BTCUSDT");
        assert_eq!(name.as_str(), "btcusdt@aggTrade");
        assert_eq!(name.kind(), StreamKind::AggTrade);
    }

    #[test]
    fn ticker_name() {
        assert_eq!(StreamName::ticker("EthBtc").as_str(), "ethbtc@ticker");
        assert_eq!(StreamName::all_tickers().kind(), StreamKind::AllTickers);
    }

    #[test]
    fn single_stream_path_uses_name_verbatim() {
        let name = StreamName::new("btcusdt@aggtrade");
        assert_eq!(name.single_stream_path(), "ws/btcusdt@aggtrade");
    }

    #[test]
    fn combined_path_joins_names() {
        let names = [StreamName::all_tickers(), StreamName::agg_trade("ETHBTC")];
        assert_eq!(
            combined_stream_path(&names),
            "stream?streams=!ticker@arr/ethbtc@aggTrade"
        );
    }

    #[test]
    fn combined_path_without_names_is_degenerate() {
        assert_eq!(combined_stream_path(&[]), "stream?streams=");
    }

    #[test]
    fn user_stream_path_keeps_listen_key_case() {
        assert_eq!(
            user_stream_path("pqia91ma19a5s61cv6a81va65sdf19v8a65a1a5s61cv6a81va65sdf19v8a65a1"),
            "ws/pqia91ma19a5s61cv6a81va65sdf19v8a65a1a5s61cv6a81va65sdf19v8a65a1"
        );
        assert_eq!(user_stream_path("AbC"), "ws/AbC");
    }

    proptest! {
        #[test]
        fn combined_path_round_trips_names(
            names in proptest::collection::vec("[a-z0-9]{1,12}@[a-zA-Z]{1,10}", 1..8)
        ) {
            let stream_names: Vec<StreamName> =
                names.iter().map(|n| StreamName::new(n.as_str())).collect();
            let path = combined_stream_path(&stream_names);
            let joined = path.strip_prefix("stream?streams=").unwrap();
            let parts: Vec<&str> = joined.split('/').collect();
            prop_assert_eq!(parts, names.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
