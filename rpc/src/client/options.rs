//!
//! Client configuration.
//!

use super::events::{ConnectionHandler, ErrorHandler, EventHandler};
use crate::imports::*;
use tether_log::LevelFilter;
use tether_websocket::client::validate_url;

pub const DEFAULT_URL: &str = "ws://localhost:6680/mopidy/ws";
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_WAIT: Duration = Duration::from_secs(5);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Reconnection schedule applied after the connection drops or an
/// opening attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt; `None` retries forever
    pub max_attempts: Option<u32>,
    /// Fixed delay between attempts
    pub delay: Duration,
}

/// Next step of the reconnection schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    After(Duration),
    Exhausted(u32),
}

impl RetryPolicy {
    pub fn unbounded(delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: None,
            delay,
        }
    }

    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: Some(max_attempts),
            delay,
        }
    }

    /// Builds a policy from a signed maximum where any negative value
    /// means unbounded.
    pub fn from_max(max_attempts: i64, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: u32::try_from(max_attempts).ok(),
            delay,
        }
    }

    /// Decides what follows once `attempts` retries have already been
    /// scheduled since the last successful open.
    pub fn next(&self, attempts: u32) -> Retry {
        match self.max_attempts {
            Some(max) if attempts >= max => Retry::Exhausted(max),
            _ => Retry::After(self.delay),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::unbounded(DEFAULT_RETRY_DELAY)
    }
}

/// Turns a bare `host:port/path` target into a `ws://` URL.
/// Targets carrying a scheme must use `ws` or `wss`.
pub fn normalize_url(target: &str) -> Result<String> {
    let target = target.trim();
    if target.is_empty() {
        return Err(Error::InvalidUrl(target.to_string()));
    }
    if target.contains("://") {
        validate_url(target).map_err(|_| Error::InvalidUrl(target.to_string()))?;
        Ok(target.to_string())
    } else {
        Ok(format!("ws://{target}"))
    }
}

/// Options supplied to [`Client::new`](super::Client::new).
pub struct ClientOptions {
    /// `ws://`/`wss://` URL or a bare `host:port/path` target
    pub url: String,
    /// Initial event subscriber
    pub event_handler: Option<Arc<dyn EventHandler>>,
    /// Receives error frames that match no pending call
    pub error_handler: Option<Arc<dyn ErrorHandler>>,
    /// Receives connectivity changes and retry exhaustion
    pub connection_handler: Option<Arc<dyn ConnectionHandler>>,
    /// Open the connection from [`Client::new`](super::Client::new)
    pub autoconnect: bool,
    /// How long the autoconnect waits for the first open
    pub connect_wait: Option<Duration>,
    pub retry: RetryPolicy,
    /// Default per-call timeout; `None` waits indefinitely
    pub call_timeout: Option<Duration>,
    /// Installed as the process-wide log level when set
    pub log_level: Option<LevelFilter>,
    pub websocket: WebSocketConfig,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            url: DEFAULT_URL.to_string(),
            event_handler: None,
            error_handler: None,
            connection_handler: None,
            autoconnect: true,
            connect_wait: Some(DEFAULT_CONNECT_WAIT),
            retry: RetryPolicy::default(),
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
            log_level: None,
            websocket: WebSocketConfig::default(),
        }
    }
}

impl ClientOptions {
    pub fn new(url: impl Into<String>) -> Self {
        ClientOptions {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn with_connection_handler(mut self, handler: Arc<dyn ConnectionHandler>) -> Self {
        self.connection_handler = Some(handler);
        self
    }

    pub fn with_autoconnect(mut self, autoconnect: bool) -> Self {
        self.autoconnect = autoconnect;
        self
    }

    pub fn with_connect_wait(mut self, wait: Option<Duration>) -> Self {
        self.connect_wait = wait;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = Some(level);
        self
    }
}

/// Options supplied to [`Client::connect`](super::Client::connect).
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Wait up to this long for the connection to open
    pub wait: Option<Duration>,
    /// Replaces the target URL for this and subsequent connections
    pub url: Option<String>,
}

impl ConnectOptions {
    pub fn blocking(wait: Duration) -> Self {
        ConnectOptions {
            wait: Some(wait),
            url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_schedule() {
        let delay = Duration::from_millis(50);
        let policy = RetryPolicy::bounded(2, delay);
        assert_eq!(policy.next(0), Retry::After(delay));
        assert_eq!(policy.next(1), Retry::After(delay));
        assert_eq!(policy.next(2), Retry::Exhausted(2));

        assert_eq!(RetryPolicy::bounded(0, delay).next(0), Retry::Exhausted(0));

        let policy = RetryPolicy::from_max(-1, delay);
        assert_eq!(policy.max_attempts, None);
        assert_eq!(policy.next(u32::MAX), Retry::After(delay));
        assert_eq!(RetryPolicy::from_max(3, delay).max_attempts, Some(3));
    }

    #[test]
    fn urls_are_normalized() {
        assert_eq!(
            normalize_url("localhost:6680/mopidy/ws").unwrap(),
            "ws://localhost:6680/mopidy/ws"
        );
        assert_eq!(
            normalize_url("wss://example.com/ws").unwrap(),
            "wss://example.com/ws"
        );
        assert!(matches!(
            normalize_url("http://example.com"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(normalize_url("  "), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.url, DEFAULT_URL);
        assert!(options.autoconnect);
        assert_eq!(options.connect_wait, Some(DEFAULT_CONNECT_WAIT));
        assert_eq!(options.call_timeout, Some(DEFAULT_CALL_TIMEOUT));
        assert_eq!(options.retry.max_attempts, None);
        assert_eq!(options.retry.delay, DEFAULT_RETRY_DELAY);
    }
}
