//! In-process WebSocket peer used by the session tests.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tether_rpc::client::{ClientOptions, ConnectionHandler, RetryPolicy};
use tether_rpc::error::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const RETRY_DELAY: Duration = Duration::from_millis(50);
/// Long enough to act while a retry timer is pending
pub const LONG_RETRY_DELAY: Duration = Duration::from_millis(200);

pub async fn within<F: Future>(future: F) -> F::Output {
    timeout(TEST_TIMEOUT, future).await.expect("Test timed out")
}

/// Polls `condition` until it holds.
pub async fn until<F: Fn() -> bool>(condition: F) {
    within(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}

pub fn options(url: &str) -> ClientOptions {
    ClientOptions {
        url: url.to_string(),
        retry: RetryPolicy::unbounded(RETRY_DELAY),
        ..Default::default()
    }
}

pub struct Peer {
    listener: TcpListener,
    url: String,
}

impl Peer {
    pub async fn bind() -> Peer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/rpc", listener.local_addr().unwrap());
        Peer { listener, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn accept(&self) -> Connection {
        within(async {
            let (stream, _) = self.listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            Connection { ws }
        })
        .await
    }

    /// Returns `true` if a client connects within `period`.
    pub async fn accepts_within(&self, period: Duration) -> bool {
        timeout(period, self.listener.accept()).await.is_ok()
    }
}

pub struct Connection {
    ws: WebSocketStream<TcpStream>,
}

impl Connection {
    /// Next request frame sent by the client.
    pub async fn next_request(&mut self) -> Value {
        within(async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                    Some(Ok(_)) => continue,
                    other => panic!("connection ended while waiting for a request: {other:?}"),
                }
            }
        })
        .await
    }

    pub async fn send(&mut self, value: Value) {
        self.send_raw(&value.to_string()).await
    }

    pub async fn send_raw(&mut self, text: &str) {
        within(self.ws.send(Message::Text(text.to_string())))
            .await
            .unwrap()
    }

    pub async fn close(mut self) {
        within(self.ws.close(None)).await.ok();
    }
}

/// Accepts TCP connections and drops them before the WebSocket
/// handshake, counting every attempt.
pub async fn dropping_peer() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/rpc", listener.local_addr().unwrap());
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_ = attempts.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            attempts_.fetch_add(1, Ordering::SeqCst);
            drop(stream);
        }
    });
    (url, attempts)
}

/// Records connection notifications.
#[derive(Default)]
pub struct Recorder {
    changes: Mutex<Vec<bool>>,
    exhausted: Mutex<Vec<u32>>,
}

impl Recorder {
    pub fn changes(&self) -> Vec<bool> {
        self.changes.lock().unwrap().clone()
    }

    pub fn exhausted(&self) -> Vec<u32> {
        self.exhausted.lock().unwrap().clone()
    }
}

impl ConnectionHandler for Recorder {
    fn connection_changed(&self, connected: bool) {
        self.changes.lock().unwrap().push(connected);
    }

    fn retries_exhausted(&self, error: &Error) {
        if let Error::RetriesExhausted(max) = error {
            self.exhausted.lock().unwrap().push(*max);
        }
    }
}
