//! [`async_channel`] re-exports and shims
pub use async_channel::*;

/// Creates a oneshot channel (bounded channel with a limit of 1 message)
pub fn oneshot<T>() -> (Sender<T>, Receiver<T>) {
    bounded(1)
}

/// [`Channel`] struct that combines [`async_channel::Sender`] and
/// [`async_channel::Receiver`] into a single struct with `sender`
/// and `receiver` members.
///
/// Holding both ends keeps the channel open for as long as the
/// [`Channel`] itself is alive.
#[derive(Debug, Clone)]
pub struct Channel<T = ()> {
    pub sender: Sender<T>,
    pub receiver: Receiver<T>,
}

impl<T> Channel<T> {
    pub fn unbounded() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn bounded(cap: usize) -> Self {
        let (sender, receiver) = bounded(cap);
        Self { sender, receiver }
    }

    pub fn oneshot() -> Self {
        let (sender, receiver) = bounded(1);
        Self { sender, receiver }
    }

    /// Removes and returns every message currently queued.
    pub fn drain(&self) -> Vec<T> {
        let mut drained = Vec::with_capacity(self.receiver.len());
        while let Ok(msg) = self.receiver.try_recv() {
            drained.push(msg);
        }
        drained
    }

    pub async fn recv(&self) -> Result<T, RecvError> {
        self.receiver.recv().await
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    pub async fn send(&self, msg: T) -> Result<(), SendError<T>> {
        self.sender.send(msg).await
    }

    pub fn try_send(&self, msg: T) -> Result<(), TrySendError<T>> {
        self.sender.try_send(msg)
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_queued_messages_in_order() {
        let channel = Channel::<u32>::unbounded();
        channel.try_send(1).unwrap();
        channel.try_send(2).unwrap();
        channel.try_send(3).unwrap();

        assert_eq!(channel.len(), 3);
        assert_eq!(channel.drain(), vec![1, 2, 3]);
        assert!(channel.is_empty());
    }

    #[test]
    fn oneshot_holds_a_single_message() {
        let channel = Channel::<u32>::oneshot();
        channel.try_send(1).unwrap();
        assert!(matches!(channel.try_send(2), Err(TrySendError::Full(2))));
        assert_eq!(channel.try_recv().unwrap(), 1);
    }
}
