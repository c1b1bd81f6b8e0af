use super::error::Error;
use crate::channel::Sender;

/// The enum containing a client-side WebSocket message.
/// This enum defines the message type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Message {
    /// Text message
    Text(String),
    /// Binary message
    Binary(Vec<u8>),
    /// Connection has Closed (delivered once, as the last message
    /// of a connection)
    Close,
}

impl Message {
    /// Returns the message payload as UTF-8 text, if it carries one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(text) => Some(text.as_str()),
            Message::Binary(data) => std::str::from_utf8(data).ok(),
            Message::Close => None,
        }
    }
}

impl TryFrom<Message> for tungstenite::Message {
    type Error = Error;
    fn try_from(message: Message) -> Result<Self, Self::Error> {
        match message {
            Message::Text(text) => Ok(tungstenite::Message::Text(text)),
            Message::Binary(data) => Ok(tungstenite::Message::Binary(data)),
            Message::Close => Err(Error::InvalidMessageType),
        }
    }
}

impl From<Vec<u8>> for Message {
    fn from(vec: Vec<u8>) -> Self {
        Message::Binary(vec)
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::Text(s)
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::Text(s.to_string())
    }
}

/// Acknowledgement channel notified once a message has been
/// handed to the socket (or has failed to be).
pub type Ack = Option<Sender<Result<(), Error>>>;
