use super::{
    config::WebSocketConfig,
    error::Error,
    message::{Ack, Message},
    result::Result,
};
use crate::channel::*;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tether_log::*;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::{
    connect_async_with_config, tungstenite::protocol::Message as TsMessage, MaybeTlsStream,
    WebSocketStream,
};

pub struct WebSocketInterface {
    url: String,
    is_open: AtomicBool,
    receiver_channel: Channel<Message>,
    sender_channel: Channel<(Message, Ack)>,
    shutdown: Channel<()>,
    terminated: watch::Sender<bool>,
}

impl WebSocketInterface {
    /// Opens the connection and spawns the dispatcher task.
    /// Returns once the WebSocket handshake has completed.
    pub async fn connect(url: &str, config: &WebSocketConfig) -> Result<Arc<WebSocketInterface>> {
        let (ws_stream, _) =
            connect_async_with_config(url, Some(config.into()), config.disable_nagle).await?;

        let (terminated, _) = watch::channel(false);
        let iface = Arc::new(WebSocketInterface {
            url: url.to_string(),
            is_open: AtomicBool::new(true),
            receiver_channel: Channel::unbounded(),
            sender_channel: Channel::unbounded(),
            shutdown: Channel::oneshot(),
            terminated,
        });

        let iface_ = iface.clone();
        tokio::spawn(async move {
            if let Err(err) = iface_.dispatcher(ws_stream).await {
                log_trace!("WebSocket dispatcher error: {}", err);
            }
        });

        Ok(iface)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_open(&self) -> bool {
        self.is_open.load(Ordering::SeqCst)
    }

    pub fn receiver(&self) -> &Channel<Message> {
        &self.receiver_channel
    }

    async fn dispatcher(
        self: &Arc<Self>,
        ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ) -> Result<()> {
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let result = loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    let result = ws_sender.close().await.map_err(Error::from);
                    break result;
                }
                dispatch = self.sender_channel.recv() => {
                    let Ok((msg, ack)) = dispatch else {
                        break Ok(());
                    };
                    let (result, fatal) = match tungstenite::Message::try_from(msg) {
                        Ok(msg) => match ws_sender.send(msg).await {
                            Ok(()) => (Ok(()), false),
                            Err(err) => (Err(Error::from(err)), true),
                        },
                        Err(err) => (Err(err), false),
                    };
                    if let Some(ack_sender) = ack {
                        ack_sender.send(result).await.unwrap_or_else(|err| {
                            log_trace!("WebSocket unable to deliver send ack: {}", err)
                        });
                    } else if let Err(err) = result {
                        log_trace!("WebSocket send error: {}", err);
                    }
                    if fatal {
                        break Err(Error::NotConnected);
                    }
                },
                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(msg)) => {
                            match msg {
                                TsMessage::Text(text) => {
                                    self.forward(Message::Text(text)).await;
                                }
                                TsMessage::Binary(data) => {
                                    self.forward(Message::Binary(data)).await;
                                }
                                TsMessage::Close(frame) => {
                                    log_trace!("WebSocket close frame received: {:?}", frame);
                                }
                                TsMessage::Ping(_) => { },
                                TsMessage::Pong(_) => { },
                                TsMessage::Frame(_frame) => { },
                            }
                        }
                        Some(Err(e)) => {
                            log_trace!("WebSocket error: {}", e);
                            break Err(e.into());
                        }
                        None => {
                            log_trace!("WebSocket connection closed");
                            break Ok(());
                        }
                    }
                }
            }
        };

        self.is_open.store(false, Ordering::SeqCst);

        // anything still queued will never reach the socket
        for (_, ack) in self.sender_channel.drain() {
            if let Some(ack_sender) = ack {
                ack_sender.try_send(Err(Error::NotConnected)).ok();
            }
        }

        self.forward(Message::Close).await;
        self.terminated.send_replace(true);

        result
    }

    async fn forward(&self, msg: Message) {
        self.receiver_channel
            .send(msg)
            .await
            .unwrap_or_else(|err| log_error!("WebSocket receiver channel error: {}", err));
    }

    /// Hands the message to the dispatcher and waits until it has been
    /// written to the socket.
    pub async fn send(self: &Arc<Self>, message: Message) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }

        let mut terminated = self.terminated.subscribe();
        let (ack_sender, ack_receiver) = oneshot();
        self.sender_channel
            .send((message, Some(ack_sender)))
            .await?;

        tokio::select! {
            ack = ack_receiver.recv() => ack.map_err(|_| Error::DispatchChannelAck)?,
            _ = terminated.wait_for(|terminated| *terminated) => {
                // the dispatcher may have acknowledged right before terminating
                ack_receiver.try_recv().unwrap_or(Err(Error::NotConnected))
            }
        }
    }

    /// Closes the socket and waits for the dispatcher task to terminate.
    pub async fn close(self: &Arc<Self>) -> Result<()> {
        let mut terminated = self.terminated.subscribe();
        if self.is_open() {
            self.shutdown.try_send(()).ok();
        }
        terminated
            .wait_for(|terminated| *terminated)
            .await
            .map_err(|_| Error::ReceiveChannel)?;
        Ok(())
    }
}
