use crate::imports::*;
use std::fmt;

/// Connection lifecycle.
///
/// `Disconnected → Connecting → Connected → Disconnected`, with `Closing`
/// entered only by an explicit disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closing => "closing",
        };
        f.write_str(state)
    }
}

/// Mutable connection state guarded by a single lock.
///
/// `generation` increases with every explicit connect or disconnect;
/// connection tasks and retry timers carrying an older generation
/// discard themselves.
pub(crate) struct Session {
    pub state: ConnectionState,
    pub generation: u64,
    pub attempts: u32,
    pub reconnect: bool,
    pub url: String,
    pub link: Option<WebSocket>,
    pub connect_signal: Option<Sender<bool>>,
}

impl Session {
    pub fn new(url: String) -> Self {
        Session {
            state: ConnectionState::Disconnected,
            generation: 0,
            attempts: 0,
            reconnect: false,
            url,
            link: None,
            connect_signal: None,
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Starts a new generation and returns it.
    pub fn advance(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Reports the outcome of the opening attempt to a waiting `connect()`.
    pub fn signal(&mut self, connected: bool) {
        if let Some(signal) = self.connect_signal.take() {
            signal.try_send(connected).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_supersede_each_other() {
        let mut session = Session::new("ws://localhost".into());
        assert_eq!(session.state, ConnectionState::Disconnected);
        let first = session.advance();
        assert!(session.is_current(first));
        let second = session.advance();
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
    }

    #[test]
    fn signal_fires_once() {
        let mut session = Session::new("ws://localhost".into());
        let (sender, receiver) = oneshot();
        session.connect_signal = Some(sender);
        session.signal(true);
        session.signal(false);
        assert!(receiver.try_recv().unwrap());
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn state_display() {
        assert_eq!(ConnectionState::Closing.to_string(), "closing");
    }
}
