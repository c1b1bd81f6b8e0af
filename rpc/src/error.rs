//!
//! [`enum@Error`] produced by the RPC client and the [`ServerError`]
//! payload carried by JSON-RPC error frames.
//!

use serde::*;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
pub use tether_websocket::client::error::Error as WebSocketError;

#[derive(Error, Debug)]
pub enum Error {
    /// Incoming frame is not valid JSON or matches no known frame shape
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Call attempted while no connection is established
    #[error("RPC client is not connected")]
    NotConnected,

    /// Server answered the call with an error frame
    #[error("RPC error {0}")]
    Rpc(ServerError),

    /// Connection dropped while the call was awaiting its reply
    #[error("connection lost while the call was pending")]
    ConnectionLost,

    /// No reply arrived within the call timeout
    #[error("RPC call timed out after {0:?}")]
    Timeout(Duration),

    /// Reconnection stopped after the configured number of retries
    #[error("giving up after {0} reconnection attempts")]
    RetriesExhausted(u32),

    /// Request id registered twice in the pending-call table
    #[error("request id {0} is already pending")]
    DuplicateId(u64),

    #[error("invalid URL `{0}`")]
    InvalidUrl(String),

    /// Underlying WebSocket error
    #[error("WebSocket -> {0}")]
    WebSocket(#[from] WebSocketError),

    #[error("SerdeJSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Unable to deserialize response data into the requested type
    #[error("RPC serde deserialization error: {0}")]
    SerdeDeserialize(String),
}

impl From<ServerError> for Error {
    fn from(err: ServerError) -> Self {
        Error::Rpc(err)
    }
}

///
/// Error object returned by the server in the `error` member of a
/// JSON-RPC frame. `data` carries any server supplied detail (for
/// example a traceback) verbatim.
///
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("code:{code} message:`{message}`")]
pub struct ServerError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ServerError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        ServerError {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<Value> for ServerError {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value::<ServerError>(value.clone())
                .unwrap_or_else(|_| ServerError {
                    code: 0,
                    message: value.to_string(),
                    data: Some(value),
                }),
            Value::String(message) => ServerError {
                code: 0,
                message: message.clone(),
                data: Some(Value::String(message)),
            },
            other => ServerError {
                code: 0,
                message: other.to_string(),
                data: Some(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_error_from_object() {
        let err = ServerError::from(json!({
            "code": -32601,
            "message": "Method not found",
            "data": {"traceback": "..."}
        }));
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Method not found");
        assert_eq!(err.data, Some(json!({"traceback": "..."})));
    }

    #[test]
    fn server_error_from_partial_object() {
        let err = ServerError::from(json!({"message": "boom"}));
        assert_eq!(err, ServerError::new(0, "boom"));
    }

    #[test]
    fn server_error_from_non_object() {
        let err = ServerError::from(json!("plain failure"));
        assert_eq!(err.message, "plain failure");
        assert_eq!(err.data, Some(json!("plain failure")));

        let err = ServerError::from(json!({"code": "not a number"}));
        assert_eq!(err.code, 0);
        assert_eq!(err.data, Some(json!({"code": "not a number"})));
    }
}
