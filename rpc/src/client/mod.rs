//!
//! JSON-RPC session client over a persistent WebSocket connection.
//!
//! [`Client`] correlates replies with pending calls by request id,
//! fans server events out to subscribers and re-establishes the
//! connection according to the configured [`RetryPolicy`].
//!
//! ```ignore
//! let client = Client::new(ClientOptions {
//!     url: "localhost:6680/mopidy/ws".into(),
//!     event_handler: Some(Arc::new(|name: &str, payload: &Value| -> HandlerResult {
//!         println!("{name}: {payload}");
//!         Ok(())
//!     })),
//!     ..Default::default()
//! })
//! .await?;
//!
//! let version = client.call("core.get_version", Value::Null, None).await?;
//! ```
//!

pub mod events;
pub mod options;
pub mod pending;
pub mod prelude;
pub mod state;

use crate::imports::*;
use crate::messages;
use events::guarded;
pub use events::{
    ConnectionHandler, ConnectionStatus, ErrorHandler, EventHandler, EventSink, HandlerResult,
};
pub use options::{ClientOptions, ConnectOptions, Retry, RetryPolicy};
use options::normalize_url;
use pending::{Outcome, PendingCall, PendingCalls};
pub use state::ConnectionState;
use state::Session;
use tether_log::LevelFilter;

/// Messages relayed to the [`ConnectionHandler`] task.
enum Status {
    Changed(bool),
    Exhausted(Error),
}

struct Inner {
    session: Mutex<Session>,
    pending: Arc<PendingCalls>,
    events: EventSink,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    status: Option<Sender<Status>>,
    next_id: AtomicU64,
    retry: RetryPolicy,
    call_timeout: Option<Duration>,
    websocket: WebSocketConfig,
}

impl Inner {
    fn locked(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> Id {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    // called with the session lock held so that notifications
    // follow the order of state transitions
    fn notify(&self, status: Status) {
        if let Some(sender) = &self.status {
            sender.try_send(status).unwrap_or_else(|err| {
                log_error!("[CONNECTION] Unable to relay connection status: {err}")
            });
        }
    }

    /// Starts a new connect series unless already connected. Returns the
    /// receiving end of the connect signal for the new generation.
    fn start(self: &Arc<Self>, url: Option<String>) -> Option<Receiver<bool>> {
        let (signal, listener) = oneshot();
        let generation = {
            let mut session = self.locked();
            if session.state == ConnectionState::Connected {
                log_warn!("[CONNECTION] Already connected to {}", session.url);
                return None;
            }
            if let Some(url) = url {
                session.url = url;
            }
            session.reconnect = true;
            session.attempts = 0;
            session.state = ConnectionState::Connecting;
            session.connect_signal = Some(signal);
            session.advance()
        };

        tokio::spawn(self.clone().run(generation));
        Some(listener)
    }

    /// Connection task of one generation: opens the transport, runs the
    /// inbound dispatch loop and retries until superseded, disabled or
    /// out of attempts.
    async fn run(self: Arc<Self>, generation: u64) {
        loop {
            let Some(url) = self.begin_attempt(generation) else {
                return;
            };

            match WebSocket::connect(&url, &self.websocket).await {
                Ok(link) => {
                    if !self.opened(generation, &link) {
                        link.close().await.unwrap_or_else(|err| {
                            log_trace!("[CONNECTION] Error closing stale connection: {err}")
                        });
                        return;
                    }
                    self.dispatch(&link).await;
                    if !self.closed(generation) {
                        return;
                    }
                }
                Err(err) => {
                    log_debug!("[CONNECTION] Unable to connect to {url}: {err}");
                    if !self.open_failed(generation) {
                        return;
                    }
                }
            }

            match self.schedule_retry(generation) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => return,
            }
        }
    }

    fn begin_attempt(&self, generation: u64) -> Option<String> {
        let mut session = self.locked();
        if !session.is_current(generation) {
            return None;
        }
        session.state = ConnectionState::Connecting;
        log_debug!("[CONNECTION] Connecting to {}", session.url);
        Some(session.url.clone())
    }

    fn opened(&self, generation: u64, link: &WebSocket) -> bool {
        let mut session = self.locked();
        if !session.is_current(generation) {
            log_debug!("[CONNECTION] Discarding superseded connection to {}", link.url());
            return false;
        }
        session.state = ConnectionState::Connected;
        session.attempts = 0;
        session.link = Some(link.clone());
        session.signal(true);
        log_info!("[CONNECTION] Connected to {}", link.url());
        self.notify(Status::Changed(true));
        true
    }

    fn open_failed(&self, generation: u64) -> bool {
        let mut session = self.locked();
        if !session.is_current(generation) {
            return false;
        }
        session.state = ConnectionState::Disconnected;
        session.signal(false);
        true
    }

    /// Returns `false` if the connection was already torn down by an
    /// explicit disconnect.
    fn closed(&self, generation: u64) -> bool {
        let mut session = self.locked();
        if !session.is_current(generation) {
            return false;
        }
        session.state = ConnectionState::Disconnected;
        session.link = None;
        let failed = self.pending.fail_all();
        log_info!(
            "[CONNECTION] Connection to {} lost ({failed} pending calls failed)",
            session.url
        );
        self.notify(Status::Changed(false));
        true
    }

    fn schedule_retry(&self, generation: u64) -> Option<Duration> {
        let mut session = self.locked();
        if !session.is_current(generation) || !session.reconnect {
            return None;
        }
        match self.retry.next(session.attempts) {
            Retry::After(delay) => {
                session.attempts = session.attempts.saturating_add(1);
                log_debug!(
                    "[CONNECTION] Reconnecting to {} in {delay:?} (retry {})",
                    session.url,
                    session.attempts
                );
                Some(delay)
            }
            Retry::Exhausted(max) => {
                session.reconnect = false;
                log_warn!(
                    "[CONNECTION] Giving up on {} after {max} reconnection attempts",
                    session.url
                );
                self.notify(Status::Exhausted(Error::RetriesExhausted(max)));
                None
            }
        }
    }

    async fn dispatch(&self, link: &WebSocket) {
        loop {
            match link.recv().await {
                Ok(WebSocketMessage::Close) => break,
                Ok(message) => match message.as_text() {
                    Some(text) => self.handle_frame(text),
                    None => log_error!("[RPC] Dropping binary frame that is not valid UTF-8"),
                },
                Err(err) => {
                    log_error!("[RPC] WebSocket receiver error: {err}");
                    break;
                }
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        match messages::decode(text) {
            Ok(Frame::Result { id, value }) => {
                self.pending.resolve(id, Outcome::Result(value));
            }
            Ok(Frame::Error {
                id: Some(id),
                error,
            }) => {
                if !self.pending.resolve(id, Outcome::Error(error.clone())) {
                    self.report_error(&error);
                }
            }
            Ok(Frame::Error { id: None, error }) => {
                log_warn!("[RPC] Server error: {error}");
                self.report_error(&error);
            }
            Ok(Frame::Event { name, payload }) => {
                log_trace!("[RPC] Event `{name}`");
                self.events.publish(&name, &payload);
            }
            Err(err) => log_error!("[RPC] Dropping frame: {err}"),
        }
    }

    fn report_error(&self, error: &ServerError) {
        if let Some(handler) = &self.error_handler {
            guarded("error", || {
                handler.handle_error(error);
                Ok(())
            });
        }
    }

    /// Registers a call against the current connection. Registration is
    /// exclusive with connection teardown, so a registered call is always
    /// either answered or failed by `fail_all`.
    fn register(&self, id: Id, method: &str) -> Result<(WebSocket, PendingCall)> {
        let session = self.locked();
        match (session.state, &session.link) {
            (ConnectionState::Connected, Some(link)) => {
                let call = self.pending.register(id, method).inspect_err(|err| {
                    log_error!("[RPC] {err}");
                })?;
                Ok((link.clone(), call))
            }
            _ => Err(Error::NotConnected),
        }
    }

    async fn disconnect(&self) {
        let (generation, link) = {
            let mut session = self.locked();
            let generation = session.advance();
            let retrying = session.reconnect;
            session.reconnect = false;
            session.attempts = 0;
            session.signal(false);
            let link = session.link.take();
            let was_connected = session.state == ConnectionState::Connected;
            if link.is_none() && session.state == ConnectionState::Disconnected {
                if retrying {
                    log_info!("[CONNECTION] Reconnection to {} cancelled", session.url);
                } else {
                    log_warn!("[CONNECTION] Already disconnected");
                }
                return;
            }
            session.state = ConnectionState::Closing;
            let failed = self.pending.fail_all();
            log_info!(
                "[CONNECTION] Disconnecting from {} ({failed} pending calls failed)",
                session.url
            );
            if was_connected {
                self.notify(Status::Changed(false));
            }
            (generation, link)
        };

        if let Some(link) = link {
            link.close().await.unwrap_or_else(|err| {
                log_debug!("[CONNECTION] Error closing connection: {err}")
            });
        }

        let mut session = self.locked();
        if session.is_current(generation) {
            session.state = ConnectionState::Disconnected;
        }
    }
}

fn status_task(handler: Arc<dyn ConnectionHandler>, receiver: Receiver<Status>) {
    tokio::spawn(async move {
        while let Ok(status) = receiver.recv().await {
            match status {
                Status::Changed(connected) => guarded("connection", || {
                    handler.connection_changed(connected);
                    Ok(())
                }),
                Status::Exhausted(err) => guarded("connection", || {
                    handler.retries_exhausted(&err);
                    Ok(())
                }),
            }
        }
    });
}

/// JSON-RPC client bound to a single endpoint.
///
/// Cloning yields another handle to the same session. Reconnection
/// continues in the background until [`Client::disconnect`] is called
/// or the [`RetryPolicy`] gives up.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Creates the client. With `autoconnect` enabled this also starts
    /// connecting and waits up to `connect_wait` for the connection
    /// to open; failing to connect within that window is not an error.
    pub async fn new(options: ClientOptions) -> Result<Client> {
        if let Some(level) = options.log_level {
            tether_log::set_log_level(level);
        }

        let url = normalize_url(&options.url)?;

        let status = options.connection_handler.map(|handler| {
            let (sender, receiver) = unbounded();
            status_task(handler, receiver);
            sender
        });

        let inner = Arc::new(Inner {
            session: Mutex::new(Session::new(url)),
            pending: PendingCalls::new(),
            events: EventSink::new(options.event_handler),
            error_handler: options.error_handler,
            status,
            next_id: AtomicU64::new(1),
            retry: options.retry,
            call_timeout: options.call_timeout,
            websocket: options.websocket,
        });

        let client = Client { inner };
        if options.autoconnect {
            client
                .connect(ConnectOptions {
                    wait: options.connect_wait,
                    url: None,
                })
                .await?;
        }
        Ok(client)
    }

    /// Starts connecting. Returns whether the client is connected once
    /// the optional wait has elapsed or the first attempt completed.
    pub async fn connect(&self, options: ConnectOptions) -> Result<bool> {
        let url = options.url.as_deref().map(normalize_url).transpose()?;
        let Some(listener) = self.inner.start(url) else {
            return Ok(true);
        };

        if let Some(wait) = options.wait {
            match tokio::time::timeout(wait, listener.recv()).await {
                Ok(Ok(true)) => {}
                Ok(_) => log_debug!("[CONNECTION] Initial connection attempt failed"),
                Err(_) => log_debug!("[CONNECTION] Not connected within {wait:?}"),
            }
        }

        Ok(self.is_connected())
    }

    /// Closes the connection and disables reconnection. Pending calls
    /// fail with [`Error::ConnectionLost`].
    pub async fn disconnect(&self) -> Result<()> {
        self.inner.disconnect().await;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.locked().state
    }

    /// Current target URL
    pub fn url(&self) -> String {
        self.inner.locked().url.clone()
    }

    /// Number of calls awaiting a reply
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.len()
    }

    /// Adds an event subscriber.
    pub fn subscribe(&self, handler: Arc<dyn EventHandler>) {
        self.inner.events.subscribe(handler);
    }

    pub fn set_log_level(&self, level: LevelFilter) {
        tether_log::set_log_level(level);
    }

    /// Invokes `method` and waits for its reply.
    ///
    /// `timeout` overrides [`ClientOptions::call_timeout`] for this call.
    /// A `null` `params` is omitted from the request.
    pub async fn call(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let id = self.inner.next_id();
        let text = messages::encode(method, &params, id)?;
        let (link, call) = self.inner.register(id, method)?;

        log_trace!("[RPC] -> `{method}` (id {id})");
        if let Err(err) = link.send(WebSocketMessage::Text(text)).await {
            log_debug!("[RPC] Unable to send `{method}` (id {id}): {err}");
            return Err(Error::NotConnected);
        }

        // dropping `call` unregisters it, which makes a late reply unmatched
        match timeout.or(self.inner.call_timeout) {
            Some(duration) => match tokio::time::timeout(duration, call.wait()).await {
                Ok(result) => result,
                Err(_) => {
                    log_debug!("[RPC] `{method}` (id {id}) timed out after {duration:?}");
                    Err(Error::Timeout(duration))
                }
            },
            None => call.wait().await,
        }
    }

    /// Typed variant of [`Client::call`] using the default timeout.
    pub async fn request<Req, Resp>(&self, method: &str, req: Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let params = serde_json::to_value(req)?;
        let value = self.call(method, params, None).await?;
        serde_json::from_value(value).map_err(|err| Error::SerdeDeserialize(err.to_string()))
    }
}
