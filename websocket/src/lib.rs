//!
//! [`tether-websocket`](self) provides the transport boundary of the tether
//! session client: one native WebSocket connection backed by tokio and
//! tungstenite.
//!
//! A [`client::WebSocket`] is opened with [`client::WebSocket::connect`] and
//! lives until either side closes it. Outgoing messages are queued on a
//! sender channel and written by a dedicated dispatcher task, which also
//! forwards every inbound text or binary message to a receiver channel.
//! When the socket terminates for any reason the receiver channel yields a
//! single [`client::Message::Close`].
//!

pub mod channel;
pub mod client;
