//!
//! [`tether_log`] provides the logging macros used across the tether crates.
//!
//! Macros such as `log_info!()` format their arguments the same way `println!()`
//! does and are filtered against a process-wide [`LevelFilter`] that can be
//! changed at runtime with [`set_log_level`].
//!
//! The following macros are available:
//! - `log_trace!()`
//! - `log_debug!()`
//! - `log_info!()`
//! - `log_warn!()`
//! - `log_error!()`
//!
//! Each macro optionally accepts a `target:` prefix, i.e.
//! `log_warn!(target: "rpc", "id {} not found", id)`.
//!
//! # Redirecting log output
//!
//! A log sink receiving every message that passes the level filter can be
//! installed with [`pipe`]. [`Sink::write`] returns `true` when the text has
//! been consumed (nothing is printed) or `false` to let the default
//! console output proceed.
//!
//! ## Example:
//!
//! ```ignore
//! use tether_log::*;
//! pub struct MySink;
//! impl Sink for MySink {
//!     fn write(&self, _target: Option<&str>, _level: Level, args: &std::fmt::Arguments<'_>) -> bool {
//!         eprintln!("{args}");
//!         true
//!     }
//! }
//! tether_log::pipe(Some(std::sync::Arc::new(MySink)));
//! ```
//!
//! The sink is removed by supplying [`Option::None`] to [`pipe`].
//!

extern crate self as tether_log;

mod log;
pub use self::log::*;

pub mod prelude {
    pub use super::log::*;
    pub use super::{log_debug, log_error, log_info, log_trace, log_warn};
}
