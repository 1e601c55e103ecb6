//! Aggregate Trade Distribution Integration Tests
//!
//! Tests delivery, termination and close handling of the trade distributor
//! against an in-process WebSocket server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use binance_stream::{AggTradeStream, AggTradeStreamEvent, StreamError};
use common::{AGG_TRADE, Then, serve};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

async fn recv(rx: &mut mpsc::Receiver<AggTradeStreamEvent>) -> Option<AggTradeStreamEvent> {
    timeout(TEST_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for distributor")
}

#[tokio::test]
async fn open_lowercases_symbol() {
    let server = serve(Vec::new(), Then::Hold).await;

    let stream = AggTradeStream::open(&server.config, "BTCUSDT").await.unwrap();
    assert_eq!(stream.name().as_str(), "btcusdt@aggTrade");
    assert_eq!(server.path.await.unwrap(), "/ws/btcusdt@aggTrade");
}

#[tokio::test]
async fn next_decodes_raw_trade() {
    let server = serve(vec![Message::text(AGG_TRADE)], Then::Hold).await;
    let mut stream = AggTradeStream::open(&server.config, "btcusdt").await.unwrap();

    let trade = timeout(TEST_TIMEOUT, stream.next()).await.unwrap().unwrap();
    assert_eq!(trade.symbol, "BTCUSDT");
    assert_eq!(trade.price, Decimal::new(1, 2));
    assert_eq!(trade.quantity, Decimal::new(100, 0));
    assert_eq!(trade.quote_quantity(), Decimal::ONE);
    assert_eq!(
        trade.timestamp().unwrap().timestamp_millis(),
        1_525_367_516_312
    );
}

#[tokio::test]
async fn trade_then_bad_frame_delivers_trade_then_one_error() {
    let frames = vec![Message::text(AGG_TRADE), Message::text("not json")];
    let server = serve(frames, Then::Hold).await;
    let stream = AggTradeStream::open(&server.config, "BTCUSDT").await.unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let handle = stream.spawn(tx);

    match recv(&mut rx).await {
        Some(AggTradeStreamEvent::Trade(trade)) => {
            assert_eq!(trade.agg_trade_id, 1);
            assert_eq!(trade.quote_quantity(), Decimal::ONE);
        }
        other => panic!("expected trade, got {other:?}"),
    }

    match recv(&mut rx).await {
        Some(AggTradeStreamEvent::Error(StreamError::Codec(_))) => {}
        other => panic!("expected codec error, got {other:?}"),
    }

    assert!(recv(&mut rx).await.is_none());
    handle.await.unwrap();
}

#[tokio::test]
async fn trades_arrive_in_socket_order() {
    let frames = (1..=5)
        .map(|id| Message::text(AGG_TRADE.replace(r#""a":1"#, &format!(r#""a":{id}"#))))
        .collect();
    let server = serve(frames, Then::Close).await;
    let stream = AggTradeStream::open(&server.config, "BTCUSDT").await.unwrap();

    // Capacity 1 forces the distributor to wait on every send
    let (tx, mut rx) = mpsc::channel(1);
    let handle = stream.spawn(tx);

    let mut ids = Vec::new();
    while let Some(event) = recv(&mut rx).await {
        match event {
            AggTradeStreamEvent::Trade(trade) => ids.push(trade.agg_trade_id),
            AggTradeStreamEvent::Error(StreamError::ConnectionClosed) => {}
            other => panic!("unexpected event {other:?}"),
        }
    }

    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    handle.await.unwrap();
}

#[tokio::test]
async fn remote_close_without_request_delivers_exactly_one_error() {
    let server = serve(Vec::new(), Then::Close).await;
    let stream = AggTradeStream::open(&server.config, "BTCUSDT").await.unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let handle = stream.spawn(tx);

    match recv(&mut rx).await {
        Some(AggTradeStreamEvent::Error(StreamError::ConnectionClosed)) => {}
        other => panic!("expected connection closed error, got {other:?}"),
    }
    assert!(recv(&mut rx).await.is_none());
    handle.await.unwrap();
}

#[tokio::test]
async fn close_while_blocked_ends_with_closed() {
    let server = serve(Vec::new(), Then::Hold).await;
    let stream = AggTradeStream::open(&server.config, "BTCUSDT").await.unwrap();
    let closer = stream.closer();

    let (tx, mut rx) = mpsc::channel(8);
    let handle = stream.spawn(tx);

    // Handshake completed; the loop reads or is parked on the read
    server.path.await.unwrap();
    closer.close();
    assert!(closer.is_close_requested());

    match recv(&mut rx).await {
        Some(AggTradeStreamEvent::Closed) => {}
        other => panic!("expected closed, got {other:?}"),
    }
    assert!(recv(&mut rx).await.is_none());

    timeout(TEST_TIMEOUT, handle).await.unwrap().unwrap();
    timeout(TEST_TIMEOUT, server.handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn close_before_subscribe_delivers_no_trades() {
    let server = serve(vec![Message::text(AGG_TRADE)], Then::Hold).await;
    let mut stream = AggTradeStream::open(&server.config, "BTCUSDT").await.unwrap();
    stream.close().await;

    let (tx, mut rx) = mpsc::channel(8);
    stream.subscribe(tx).await;

    match rx.recv().await {
        Some(AggTradeStreamEvent::Closed) => {}
        other => panic!("expected closed, got {other:?}"),
    }
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn close_without_subscriber_releases_socket() {
    let server = serve(Vec::new(), Then::Hold).await;
    let mut stream = AggTradeStream::open(&server.config, "BTCUSDT").await.unwrap();

    stream.close().await;

    // The server task only finishes once the client side of the socket is gone
    timeout(TEST_TIMEOUT, server.handle).await.unwrap().unwrap();
    assert!(matches!(stream.next().await, Err(StreamError::CloseRequested)));
}

#[tokio::test]
async fn close_during_blocked_send_keeps_pending_trade() {
    let frames = (1..=2)
        .map(|id| Message::text(AGG_TRADE.replace(r#""a":1"#, &format!(r#""a":{id}"#))))
        .collect();
    let server = serve(frames, Then::Hold).await;
    let stream = AggTradeStream::open(&server.config, "BTCUSDT").await.unwrap();
    let closer = stream.closer();

    let (tx, mut rx) = mpsc::channel(1);
    let handle = stream.spawn(tx);

    // First trade fills the only slot; give the loop time to read the second
    // trade and wait on the full channel.
    while rx.is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;
    closer.close();

    let mut ids = Vec::new();
    while let Some(event) = recv(&mut rx).await {
        match event {
            AggTradeStreamEvent::Trade(trade) => ids.push(trade.agg_trade_id),
            AggTradeStreamEvent::Closed => {}
            other => panic!("unexpected event {other:?}"),
        }
    }

    assert_eq!(ids, vec![1, 2]);
    timeout(TEST_TIMEOUT, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn close_with_full_channel_drops_signal() {
    let frames = vec![Message::text(AGG_TRADE)];
    let server = serve(frames, Then::Hold).await;
    let stream = AggTradeStream::open(&server.config, "BTCUSDT").await.unwrap();
    let closer = stream.closer();

    let (tx, mut rx) = mpsc::channel(1);
    let handle = stream.spawn(tx);

    // Wait until the single slot holds the trade
    while rx.is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    closer.close();
    timeout(TEST_TIMEOUT, handle).await.unwrap().unwrap();

    // At most one terminal signal, never after the channel closes
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert!(matches!(events[0], AggTradeStreamEvent::Trade(_)));
    assert!(events.len() <= 2);
    if let Some(last) = events.get(1) {
        assert!(matches!(last, AggTradeStreamEvent::Closed));
    }
}

#[tokio::test]
async fn dropped_receiver_stops_distributor() {
    let frames = vec![Message::text(AGG_TRADE), Message::text(AGG_TRADE)];
    let server = serve(frames, Then::Hold).await;
    let stream = AggTradeStream::open(&server.config, "BTCUSDT").await.unwrap();

    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    timeout(TEST_TIMEOUT, stream.spawn(tx)).await.unwrap().unwrap();
}
