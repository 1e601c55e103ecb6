//! In-process WebSocket server for integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use binance_stream::StreamClientConfig;

pub const AGG_TRADE: &str = r#"{"e":"aggTrade","E":1525367516316,"s":"BTCUSDT","a":1,"p":"0.01000000","q":"100.00000000","f":1,"l":1,"T":1525367516312,"m":false,"M":false}"#;

pub const TICKERS: &str = r#"[{"e":"24hrTicker","E":123456789,"s":"BNBBTC","p":"0.0015","P":"250.00","w":"0.0018","x":"0.0009","c":"0.0025","Q":"10","b":"0.0024","B":"10","a":"0.0026","A":"100","o":"0.0010","h":"0.0025","l":"0.0010","v":"10000","q":"18","O":0,"C":86400000,"F":0,"L":18150,"n":18151}]"#;

/// What the server does once its scripted frames are sent.
#[derive(Debug, Clone, Copy)]
pub enum Then {
    /// Send a close frame.
    Close,
    /// Keep the connection open until the client goes away.
    Hold,
}

/// A running single-connection test server.
pub struct TestServer {
    pub config: StreamClientConfig,
    pub path: oneshot::Receiver<String>,
    pub handle: JoinHandle<()>,
}

/// Accept one WebSocket connection, send `frames`, then act per `then`.
pub async fn serve(frames: Vec<Message>, then: Then) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (path_tx, path_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let _ = path_tx.send(req.uri().to_string());
            Ok(resp)
        };
        let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(socket, callback).await else {
            return;
        };

        for frame in frames {
            if ws.send(frame).await.is_err() {
                return;
            }
        }

        if matches!(then, Then::Close) {
            let _ = ws.close(None).await;
        }

        while let Some(Ok(_)) = ws.next().await {}
    });

    TestServer {
        config: StreamClientConfig::new(format!("ws://{addr}")),
        path: path_rx,
        handle,
    }
}

/// Accept one TCP connection and answer the upgrade with `status_line`.
pub async fn refuse(status_line: &'static str) -> StreamClientConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0_u8; 2048];
        let _ = socket.read(&mut buf).await;
        let response = format!("HTTP/1.1 {status_line}\r\nContent-Length: 0\r\n\r\n");
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    StreamClientConfig::new(format!("ws://{addr}"))
}

/// Wrap `data` in a combined-stream envelope.
pub fn combined(stream: &str, data: &str) -> Message {
    Message::text(format!(r#"{{"stream":"{stream}","data":{data}}}"#))
}
