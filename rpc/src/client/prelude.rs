//!
//! Convenience module exporting all types required for the client use.
//!
pub use crate::client::{
    Client, ClientOptions, ConnectOptions, ConnectionHandler, ConnectionState, ConnectionStatus,
    ErrorHandler, EventHandler, HandlerResult, RetryPolicy,
};
pub use crate::error::{Error, ServerError};
pub use crate::result::Result;
pub use serde_json::Value;
