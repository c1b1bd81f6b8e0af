//!
//! JSON-RPC 2.0 session client over a single persistent WebSocket
//! connection.
//!
//! Features:
//! - Request/response correlation by request id with per-call timeouts
//! - Server-pushed events delivered to any number of subscribers
//! - Transparent reconnection driven by a [`RetryPolicy`](client::RetryPolicy)
//! - Connectivity notifications through a [`ConnectionHandler`](client::ConnectionHandler)
//!
//! Every call resolves with exactly one outcome: the result, the server
//! error, [`Error::ConnectionLost`](error::Error::ConnectionLost) when the
//! connection drops first, or [`Error::Timeout`](error::Error::Timeout).
//!
//! The client is built on top of [`tether_websocket`], which uses
//! [Tokio](https://crates.io/crates/tokio) and
//! [Tungstenite](https://crates.io/crates/tungstenite).
//!
//! ```ignore
//! use tether_rpc::prelude::*;
//!
//! let client = Client::new(ClientOptions::new("localhost:6680/mopidy/ws")).await?;
//! let version: String = client.request("core.get_version", ()).await?;
//! ```
//!

extern crate self as tether_rpc;

pub mod client;
pub mod error;
mod imports;
pub mod messages;
pub mod result;

pub mod prelude {
    pub use crate::client::prelude::*;
}
