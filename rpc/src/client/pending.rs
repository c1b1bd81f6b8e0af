//!
//! Table of in-flight calls keyed by request id.
//!

use crate::imports::*;
use std::sync::Weak;

/// Terminal outcome delivered to a waiting call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Result(Value),
    Error(ServerError),
    ConnectionLost,
}

struct Pending {
    method: String,
    timestamp: Instant,
    sender: Sender<Outcome>,
}

/// Pending-call table. Every registered call receives exactly one
/// [`Outcome`]: a reply, or [`Outcome::ConnectionLost`] when the
/// connection drops first.
#[derive(Default)]
pub struct PendingCalls {
    map: Mutex<AHashMap<Id, Pending>>,
}

impl PendingCalls {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn locked(&self) -> MutexGuard<'_, AHashMap<Id, Pending>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a waiting slot for `id`.
    pub fn register(self: &Arc<Self>, id: Id, method: &str) -> Result<PendingCall> {
        let (sender, receiver) = oneshot();
        let mut map = self.locked();
        if map.contains_key(&id) {
            return Err(Error::DuplicateId(id));
        }
        map.insert(
            id,
            Pending {
                method: method.to_string(),
                timestamp: Instant::now(),
                sender,
            },
        );
        Ok(PendingCall {
            id,
            receiver,
            table: Arc::downgrade(self),
        })
    }

    /// Delivers `outcome` to the call waiting on `id` and removes it.
    /// Returns `false` if no such call is pending.
    pub fn resolve(&self, id: Id, outcome: Outcome) -> bool {
        let Some(pending) = self.locked().remove(&id) else {
            log_warn!("[RPC] Dropping reply for unknown request id {id}");
            return false;
        };
        log_trace!(
            "[RPC] `{}` (id {id}) completed in {:?}",
            pending.method,
            pending.timestamp.elapsed()
        );
        pending.sender.try_send(outcome).is_ok()
    }

    /// Removes the call without delivering anything.
    pub fn remove(&self, id: Id) -> bool {
        self.locked().remove(&id).is_some()
    }

    /// Fails every pending call with [`Outcome::ConnectionLost`] and
    /// empties the table. Returns the number of calls failed.
    pub fn fail_all(&self) -> usize {
        let drained = self.locked().drain().collect::<Vec<_>>();
        for (id, pending) in drained.iter() {
            log_debug!("[RPC] `{}` (id {id}) failed: connection lost", pending.method);
            pending.sender.try_send(Outcome::ConnectionLost).ok();
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }
}

/// Caller side of a registered call. Dropping it before an outcome
/// arrives unregisters the call, so a late reply is treated as unmatched.
pub struct PendingCall {
    id: Id,
    receiver: Receiver<Outcome>,
    table: Weak<PendingCalls>,
}

impl PendingCall {
    pub fn id(&self) -> Id {
        self.id
    }

    pub async fn wait(&self) -> Result<Value> {
        match self.receiver.recv().await {
            Ok(Outcome::Result(value)) => Ok(value),
            Ok(Outcome::Error(error)) => Err(Error::Rpc(error)),
            Ok(Outcome::ConnectionLost) | Err(_) => Err(Error::ConnectionLost),
        }
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolve_delivers_to_matching_call() {
        let table = PendingCalls::new();
        let first = table.register(1, "core.get_version").unwrap();
        let second = table.register(2, "core.describe").unwrap();
        assert_eq!(table.len(), 2);

        assert!(table.resolve(2, Outcome::Error(ServerError::new(-1, "nope"))));
        assert!(table.resolve(1, Outcome::Result(json!("3.4.2"))));
        assert!(table.is_empty());

        assert_eq!(first.wait().await.unwrap(), json!("3.4.2"));
        assert!(matches!(second.wait().await, Err(Error::Rpc(err)) if err.code == -1));
    }

    #[tokio::test]
    async fn fail_all_fails_every_call_once() {
        let table = PendingCalls::new();
        let calls = (1..=3)
            .map(|id| table.register(id, "m").unwrap())
            .collect::<Vec<_>>();

        assert_eq!(table.fail_all(), 3);
        assert!(table.is_empty());
        assert_eq!(table.fail_all(), 0);

        for call in calls {
            assert!(matches!(call.wait().await, Err(Error::ConnectionLost)));
        }
    }

    #[test]
    fn unknown_and_duplicate_ids() {
        let table = PendingCalls::new();
        assert!(!table.resolve(9, Outcome::Result(Value::Null)));

        let _call = table.register(1, "m").unwrap();
        assert!(matches!(table.register(1, "m"), Err(Error::DuplicateId(1))));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn dropping_a_call_unregisters_it() {
        let table = PendingCalls::new();
        let call = table.register(5, "m").unwrap();
        assert_eq!(call.id(), 5);
        drop(call);
        assert!(table.is_empty());
        assert!(!table.resolve(5, Outcome::Result(Value::Null)));
    }
}
