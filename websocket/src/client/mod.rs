//!
//! async WebSocket client functionality (requires the tokio executor)
//!

mod native;
use native::WebSocketInterface;

pub mod config;
pub mod error;
pub mod message;
pub mod result;

pub use config::WebSocketConfig;
pub use error::Error;
pub use message::*;
pub use result::Result;

use std::sync::Arc;

/// Returns `Ok(())` if the URL carries a WebSocket scheme.
pub fn validate_url(url: &str) -> Result<()> {
    if !url.starts_with("ws://") && !url.starts_with("wss://") {
        return Err(Error::AddressSchema(url.to_string()));
    }
    Ok(())
}

/// A single open WebSocket connection.
///
/// The connection is established by [`WebSocket::connect`] and is never
/// re-established: once it terminates, [`WebSocket::recv`] yields
/// [`Message::Close`] and every subsequent [`WebSocket::send`] fails with
/// [`Error::NotConnected`]. Reconnection policy belongs to the owner.
#[derive(Clone)]
pub struct WebSocket {
    inner: Arc<WebSocketInterface>,
}

impl WebSocket {
    /// Connects to the given URL, returning once the handshake completed.
    pub async fn connect(url: &str, config: &WebSocketConfig) -> Result<WebSocket> {
        validate_url(url)?;
        let inner = WebSocketInterface::connect(url, config).await?;
        Ok(WebSocket { inner })
    }

    /// Get the URL this connection was opened with
    pub fn url(&self) -> &str {
        self.inner.url()
    }

    /// Returns true if websocket is connected, false otherwise
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    /// Sends a message to the destination server. This function
    /// will block until until the message was relayed to the
    /// underlying websocket implementation.
    pub async fn send(&self, message: Message) -> Result<&Self> {
        self.inner.send(message).await?;
        Ok(self)
    }

    /// Receives message from the websocket. Blocks until a message is
    /// received from the underlying websocket connection.
    pub async fn recv(&self) -> Result<Message> {
        Ok(self.inner.receiver().recv().await?)
    }

    /// Closes the connection and waits for the dispatcher to shut down.
    /// Closing an already closed connection is a no-op.
    pub async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
