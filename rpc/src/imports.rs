pub use crate::error::{Error, ServerError};
pub use crate::messages::{Frame, Id};
pub use crate::result::Result;
pub use ahash::AHashMap;
pub use serde::{de::DeserializeOwned, Deserialize, Serialize};
pub use serde_json::{self, Value};
pub use std::sync::atomic::{AtomicU64, Ordering};
pub use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
pub use std::time::{Duration, Instant};
pub use tether_log::{log_debug, log_error, log_info, log_trace, log_warn};
pub use tether_websocket::channel::{oneshot, unbounded, Receiver, Sender};
pub use tether_websocket::client::{Message as WebSocketMessage, WebSocket, WebSocketConfig};
