use crate::channel::{RecvError, SendError, TrySendError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("WebSocket URL must start with ws:// or wss:// - supplied argument is:`{0}`")]
    AddressSchema(String),

    #[error("Invalid message type")]
    InvalidMessageType,

    #[error("WebSocket is not connected")]
    NotConnected,

    #[error("Dispatch channel ack error")]
    DispatchChannelAck,

    #[error("Channel send error")]
    ChannelSend,

    #[error("Receive channel error")]
    ReceiveChannel,

    #[error("WebSocket error: {0}")]
    Tungstenite(#[from] tungstenite::Error),
}

impl<T> From<SendError<T>> for Error {
    fn from(_error: SendError<T>) -> Error {
        Error::ChannelSend
    }
}

impl<T> From<TrySendError<T>> for Error {
    fn from(_error: TrySendError<T>) -> Error {
        Error::ChannelSend
    }
}

impl From<RecvError> for Error {
    fn from(_: RecvError) -> Error {
        Error::ReceiveChannel
    }
}
