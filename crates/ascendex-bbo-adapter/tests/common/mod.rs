/*
[INPUT]:  Scripted exchange behaviour for a single connection
[OUTPUT]: In-process WebSocket server, frame fixtures, fast configs
[POS]:    Test infrastructure - shared across integration tests
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for ascendex-bbo-adapter tests

#![allow(dead_code)]

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ascendex_bbo_adapter::StreamConfig;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::CONTENT_TYPE;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};

pub type ServerStream = WebSocketStream<TcpStream>;

/// One-connection exchange stand-in
pub struct MockExchange {
    pub url: String,
    pub content_type: Arc<Mutex<Option<String>>>,
    pub task: JoinHandle<()>,
}

/// Accept a single client and hand the server side of the socket to `script`.
pub async fn spawn_exchange<F, Fut>(script: F) -> MockExchange
where
    F: FnOnce(ServerStream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("listener address");
    let content_type = Arc::new(Mutex::new(None));
    let captured = content_type.clone();

    let task = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept client");
        let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            let value = request
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            *captured.lock().expect("content type lock") = value;
            Ok(response)
        };
        let ws = accept_hdr_async(tcp, callback).await.expect("server handshake");
        script(ws).await;
    });

    MockExchange {
        url: format!("ws://{addr}"),
        content_type,
        task,
    }
}

/// Next text frame from the client, skipping control frames.
pub async fn next_text(ws: &mut ServerStream) -> String {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
            Some(Ok(_)) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

/// Keep reading (and auto-answering pings) until the client goes away.
pub async fn drain(ws: &mut ServerStream) {
    while let Some(Ok(_)) = ws.next().await {}
}

pub fn bbo_frame(bid: &[&str], ask: &[&str]) -> String {
    serde_json::json!({
        "m": "bbo",
        "symbol": "BTC/USDT",
        "data": { "ts": 1_573_068_442_532_i64, "bid": bid, "ask": ask },
    })
    .to_string()
}

pub fn test_config(url: &str) -> StreamConfig {
    StreamConfig::default()
        .with_endpoint(url)
        .with_idle_timeout(Duration::from_secs(5))
}

/// Unused local address; connecting to it is refused.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    format!("ws://{addr}")
}
