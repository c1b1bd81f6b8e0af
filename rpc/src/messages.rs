//!
//! JSON-RPC 2.0 message encoding and decoding.
//!
//! Outgoing requests are encoded with [`encode`]. Incoming text frames are
//! classified by [`decode`] into a [`Frame`]: a successful result, an error
//! reply or a server-pushed event.
//!

use crate::error::{Error, ServerError};
use crate::result::Result;
use serde::Serialize;
use serde_json::{Map, Value};

/// Request identifier. Allocated by the client, echoed back by the server.
pub type Id = u64;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
pub struct JsonClientMessage<'a> {
    pub jsonrpc: &'static str,
    pub id: Id,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<&'a Value>,
}

impl<'a> JsonClientMessage<'a> {
    pub fn new(id: Id, method: &'a str, params: &'a Value) -> Self {
        JsonClientMessage {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params: (!params.is_null()).then_some(params),
        }
    }
}

/// Classified incoming frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Successful reply to the request with the given id
    Result { id: Id, value: Value },
    /// Error reply; `id` is absent when the server could not
    /// attribute the error to a request
    Error { id: Option<Id>, error: ServerError },
    /// Unsolicited server event
    Event { name: String, payload: Value },
}

/// Encodes a request. `params` is omitted from the frame when it is `null`.
pub fn encode(method: &str, params: &Value, id: Id) -> Result<String> {
    Ok(serde_json::to_string(&JsonClientMessage::new(
        id, method, params,
    ))?)
}

/// Classifies an incoming text frame.
///
/// A frame carrying `result` is a reply and must carry a numeric `id`.
/// A frame carrying `error` is an error reply with an optional `id`.
/// A frame carrying a string `event` and no `id` is an event whose payload
/// is the `data` member when present, or the remaining members otherwise.
/// Anything else fails with [`Error::MalformedFrame`].
pub fn decode(text: &str) -> Result<Frame> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| Error::MalformedFrame(format!("invalid JSON: {err}")))?;

    let Value::Object(mut object) = value else {
        return Err(Error::MalformedFrame("frame is not a JSON object".into()));
    };

    let id = match object.remove("id") {
        None | Some(Value::Null) => None,
        Some(id) => Some(
            id.as_u64()
                .ok_or_else(|| Error::MalformedFrame(format!("invalid id `{id}`")))?,
        ),
    };

    if let Some(value) = object.remove("result") {
        let id = id.ok_or_else(|| Error::MalformedFrame("result without id".into()))?;
        return Ok(Frame::Result { id, value });
    }

    if let Some(error) = object.remove("error") {
        return Ok(Frame::Error {
            id,
            error: error.into(),
        });
    }

    if id.is_none() {
        if let Some(event) = object.remove("event") {
            let Value::String(name) = event else {
                return Err(Error::MalformedFrame(format!(
                    "event name is not a string: `{event}`"
                )));
            };
            return Ok(Frame::Event {
                name,
                payload: event_payload(object),
            });
        }
    }

    Err(Error::MalformedFrame(
        "frame carries neither result, error nor event".into(),
    ))
}

fn event_payload(mut object: Map<String, Value>) -> Value {
    match object.remove("data") {
        Some(data) => data,
        None => {
            object.remove("jsonrpc");
            Value::Object(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn malformed(text: &str) -> bool {
        matches!(decode(text), Err(Error::MalformedFrame(_)))
    }

    #[test]
    fn encode_request() {
        let text = encode("core.get_version", &Value::Null, 1).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": 1, "method": "core.get_version"})
        );

        let params = json!({"uri": "file:///a.mp3"});
        let text = encode("tracklist.add", &params, 7).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["params"], params);
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn decode_result() {
        assert_eq!(
            decode(r#"{"jsonrpc":"2.0","id":1,"result":"3.4.2"}"#).unwrap(),
            Frame::Result {
                id: 1,
                value: json!("3.4.2")
            }
        );
        // a null result is still a result
        assert_eq!(
            decode(r#"{"jsonrpc":"2.0","id":2,"result":null}"#).unwrap(),
            Frame::Result {
                id: 2,
                value: Value::Null
            }
        );
    }

    #[test]
    fn decode_error() {
        let frame = decode(
            r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            Frame::Error {
                id: Some(3),
                error: ServerError::new(-32601, "Method not found")
            }
        );

        let frame =
            decode(r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#)
                .unwrap();
        assert!(matches!(frame, Frame::Error { id: None, .. }));
    }

    #[test]
    fn decode_event_payload_forms() {
        assert_eq!(
            decode(r#"{"event":"volume_changed","volume":42}"#).unwrap(),
            Frame::Event {
                name: "volume_changed".into(),
                payload: json!({"volume": 42})
            }
        );
        assert_eq!(
            decode(r#"{"event":"track_playback_started","data":{"tl_track":{"tlid":1}}}"#)
                .unwrap(),
            Frame::Event {
                name: "track_playback_started".into(),
                payload: json!({"tl_track": {"tlid": 1}})
            }
        );
    }

    #[test]
    fn decode_rejects_malformed_frames() {
        assert!(malformed("not json"));
        assert!(malformed("[1,2,3]"));
        assert!(malformed(r#"{"foo":1}"#));
        assert!(malformed(r#"{"result":1}"#));
        assert!(malformed(r#"{"id":"abc","result":1}"#));
        assert!(malformed(r#"{"event":5}"#));
        // an identified frame is never an event
        assert!(malformed(r#"{"id":4,"event":"x"}"#));
    }
}
