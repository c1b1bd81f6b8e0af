//!
//! Application callbacks: server events, unattributed server errors
//! and connectivity changes.
//!

use crate::imports::*;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Receives server-pushed events.
///
/// Implemented for any `Fn(&str, &Value) -> HandlerResult` closure.
pub trait EventHandler: Send + Sync + 'static {
    fn handle_event(&self, name: &str, payload: &Value) -> HandlerResult;
}

impl<F> EventHandler for F
where
    F: Fn(&str, &Value) -> HandlerResult + Send + Sync + 'static,
{
    fn handle_event(&self, name: &str, payload: &Value) -> HandlerResult {
        self(name, payload)
    }
}

/// Receives error frames that cannot be matched to a pending call.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle_error(&self, error: &ServerError);
}

impl<F> ErrorHandler for F
where
    F: Fn(&ServerError) + Send + Sync + 'static,
{
    fn handle_error(&self, error: &ServerError) {
        self(error)
    }
}

/// Connectivity notification passed to closure connection handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    /// Reconnection gave up after the given number of retries
    RetriesExhausted(u32),
}

/// Receives connectivity changes. Notifications are delivered in
/// order from a dedicated task, never from the connection task itself.
///
/// Implemented for any `Fn(ConnectionStatus)` closure.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Invoked once per transition into or out of the connected state.
    fn connection_changed(&self, connected: bool);

    /// Invoked once when reconnection gives up; carries
    /// [`Error::RetriesExhausted`].
    fn retries_exhausted(&self, error: &Error) {
        log_warn!("[CONNECTION] {error}");
    }
}

impl<F> ConnectionHandler for F
where
    F: Fn(ConnectionStatus) + Send + Sync + 'static,
{
    fn connection_changed(&self, connected: bool) {
        self(if connected {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        })
    }

    fn retries_exhausted(&self, error: &Error) {
        if let Error::RetriesExhausted(max) = error {
            self(ConnectionStatus::RetriesExhausted(*max))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

/// Runs an application callback, logging its failure or panic.
pub(crate) fn guarded<F>(context: &str, callback: F)
where
    F: FnOnce() -> HandlerResult,
{
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log_error!("[RPC] {context} handler failed: {err}"),
        Err(panic) => log_error!("[RPC] {context} handler panicked: {}", panic_message(&*panic)),
    }
}

/// Fan-out of server events to subscribed handlers.
#[derive(Default)]
pub struct EventSink {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventSink {
    pub fn new(handler: Option<Arc<dyn EventHandler>>) -> Self {
        EventSink {
            handlers: RwLock::new(handler.into_iter().collect()),
        }
    }

    pub fn subscribe(&self, handler: Arc<dyn EventHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    pub fn is_empty(&self) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Delivers the event to every handler in subscription order and
    /// returns the number of handlers invoked. A failing handler does
    /// not prevent delivery to the others.
    pub fn publish(&self, name: &str, payload: &Value) -> usize {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if handlers.is_empty() {
            log_trace!("[RPC] No subscriber for event `{name}`");
        }

        for handler in handlers.iter() {
            guarded("event", || handler.handle_event(name, payload));
        }
        handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn publish_reaches_every_subscriber() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = EventSink::default();
        assert!(sink.is_empty());
        assert_eq!(sink.publish("ignored", &Value::Null), 0);

        let seen_ = seen.clone();
        sink.subscribe(Arc::new(move |name: &str, payload: &Value| -> HandlerResult {
            seen_.lock().unwrap().push((name.to_string(), payload.clone()));
            Ok(())
        }));

        assert_eq!(sink.publish("volume_changed", &json!({"volume": 42})), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("volume_changed".to_string(), json!({"volume": 42}))]
        );
    }

    #[test]
    fn closure_connection_handler_hears_every_status() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_ = seen.clone();
        let handler: Arc<dyn ConnectionHandler> =
            Arc::new(move |status: ConnectionStatus| seen_.lock().unwrap().push(status));

        handler.connection_changed(true);
        handler.connection_changed(false);
        handler.retries_exhausted(&Error::RetriesExhausted(2));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ConnectionStatus::Connected,
                ConnectionStatus::Disconnected,
                ConnectionStatus::RetriesExhausted(2),
            ]
        );
    }

    #[test]
    fn failing_handlers_do_not_stop_delivery() {
        let count = Arc::new(AtomicU64::new(0));
        let sink = EventSink::new(Some(Arc::new(
            |_: &str, _: &Value| -> HandlerResult { Err("refused".into()) },
        )));
        sink.subscribe(Arc::new(|_: &str, _: &Value| -> HandlerResult {
            panic!("handler bug")
        }));
        let count_ = count.clone();
        sink.subscribe(Arc::new(move |_: &str, _: &Value| -> HandlerResult {
            count_.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        assert_eq!(sink.publish("options_changed", &Value::Null), 3);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
