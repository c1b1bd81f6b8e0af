use cfg_if::cfg_if;
use std::fmt;
use std::sync::Mutex;

pub use log::{Level, LevelFilter};

lazy_static::lazy_static! {
    static ref LEVEL_FILTER : Mutex<LevelFilter> = Mutex::new(LevelFilter::Info);
}

/// Returns true if messages of the given [`Level`] pass
/// the currently installed [`LevelFilter`]
#[inline(always)]
pub fn log_level_enabled(level: Level) -> bool {
    match LEVEL_FILTER.lock() {
        Ok(filter) => *filter >= level,
        Err(poisoned) => *poisoned.into_inner() >= level,
    }
}

/// Enable filtering of log messages using the [`LevelFilter`]
pub fn set_log_level(level: LevelFilter) {
    match LEVEL_FILTER.lock() {
        Ok(mut filter) => *filter = level,
        Err(poisoned) => *poisoned.into_inner() = level,
    }
}

/// Returns the currently installed [`LevelFilter`]
pub fn log_level() -> LevelFilter {
    match LEVEL_FILTER.lock() {
        Ok(filter) => *filter,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

cfg_if! {
    if #[cfg(feature = "sink")] {
        use std::sync::Arc;

        /// A log sink trait that can be installed into the log subsystem using the [`pipe`]
        /// function and will receive all log messages.
        pub trait Sink: Send + Sync + 'static {
            fn write(&self, target: Option<&str>, level: Level, args: &fmt::Arguments<'_>) -> bool;
        }

        lazy_static::lazy_static! {
            static ref SINK : Mutex<Option<Arc<dyn Sink>>> = Mutex::new(None);
        }

        /// Receives an Option with an `Arc`ed [`Sink`] trait reference
        /// and installs it as a log sink / receiver.
        /// The sink can be later disabled by invoking `pipe(None)`
        pub fn pipe(sink: Option<Arc<dyn Sink>>) {
            match SINK.lock() {
                Ok(mut current) => *current = sink,
                Err(poisoned) => *poisoned.into_inner() = sink,
            }
        }

        #[inline(always)]
        fn to_sink(target: Option<&str>, level: Level, args: &fmt::Arguments<'_>) -> bool {
            // clone out of the lock so a sink may log without deadlocking
            let sink = match SINK.lock() {
                Ok(sink) => sink.clone(),
                Err(_) => None,
            };
            match sink {
                Some(sink) => sink.write(target, level, args),
                None => false,
            }
        }
    }
}

#[cfg(feature = "external-logger")]
mod tether_logger {
    use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

    pub struct TetherLogger;

    impl log::Log for TetherLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            super::log_level_enabled(metadata.level())
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                let target = Some(record.target());
                match record.metadata().level() {
                    Level::Error => super::impls::error_impl(target, record.args()),
                    Level::Warn => super::impls::warn_impl(target, record.args()),
                    Level::Info => super::impls::info_impl(target, record.args()),
                    Level::Debug => super::impls::debug_impl(target, record.args()),
                    Level::Trace => super::impls::trace_impl(target, record.args()),
                }
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: TetherLogger = TetherLogger;

    pub fn init() -> Result<(), SetLoggerError> {
        log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Trace))
    }
}

/// Installs the tether logger as the global `log` facade backend.
#[cfg(feature = "external-logger")]
pub fn init() -> Result<(), log::SetLoggerError> {
    tether_logger::init()
}

pub mod impls {
    use super::*;

    #[inline(always)]
    fn emit(target: Option<&str>, level: Level, args: &fmt::Arguments<'_>) {
        if !log_level_enabled(level) {
            return;
        }

        #[cfg(feature = "sink")]
        {
            if to_sink(target, level, args) {
                return;
            }
        }

        match (target, level) {
            (Some(target), Level::Error | Level::Warn) => eprintln!("[{target}] {args}"),
            (None, Level::Error | Level::Warn) => eprintln!("{args}"),
            (Some(target), _) => println!("[{target}] {args}"),
            (None, _) => println!("{args}"),
        }
    }

    #[inline(always)]
    pub fn error_impl(target: Option<&str>, args: &fmt::Arguments<'_>) {
        emit(target, Level::Error, args)
    }

    #[inline(always)]
    pub fn warn_impl(target: Option<&str>, args: &fmt::Arguments<'_>) {
        emit(target, Level::Warn, args)
    }

    #[inline(always)]
    pub fn info_impl(target: Option<&str>, args: &fmt::Arguments<'_>) {
        emit(target, Level::Info, args)
    }

    #[inline(always)]
    pub fn debug_impl(target: Option<&str>, args: &fmt::Arguments<'_>) {
        emit(target, Level::Debug, args)
    }

    #[inline(always)]
    pub fn trace_impl(target: Option<&str>, args: &fmt::Arguments<'_>) {
        emit(target, Level::Trace, args)
    }
}

/// Format and log message with [`Level::Error`]
#[macro_export]
macro_rules! log_error {
    (target: $target:expr, $($arg:tt)+) => (
        $crate::impls::error_impl(Some($target), &format_args!($($arg)+))
    );

    ($($t:tt)*) => (
        $crate::impls::error_impl(None, &format_args!($($t)*))
    )
}

/// Format and log message with [`Level::Warn`]
#[macro_export]
macro_rules! log_warn {
    (target: $target:expr, $($arg:tt)+) => (
        $crate::impls::warn_impl(Some($target), &format_args!($($arg)+))
    );

    ($($t:tt)*) => (
        $crate::impls::warn_impl(None, &format_args!($($t)*))
    )
}

/// Format and log message with [`Level::Info`]
#[macro_export]
macro_rules! log_info {
    (target: $target:expr, $($arg:tt)+) => (
        $crate::impls::info_impl(Some($target), &format_args!($($arg)+))
    );

    ($($t:tt)*) => (
        $crate::impls::info_impl(None, &format_args!($($t)*))
    )
}

/// Format and log message with [`Level::Debug`]
#[macro_export]
macro_rules! log_debug {
    (target: $target:expr, $($arg:tt)+) => (
        $crate::impls::debug_impl(Some($target), &format_args!($($arg)+))
    );

    ($($t:tt)*) => (
        $crate::impls::debug_impl(None, &format_args!($($t)*))
    )
}

/// Format and log message with [`Level::Trace`]
#[macro_export]
macro_rules! log_trace {
    (target: $target:expr, $($arg:tt)+) => (
        $crate::impls::trace_impl(Some($target), &format_args!($($arg)+))
    );

    ($($t:tt)*) => (
        $crate::impls::trace_impl(None, &format_args!($($t)*))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // the filter is process-wide, so every assertion about it lives in one test
    #[test]
    fn level_filter_gates_levels() {
        set_log_level(LevelFilter::Warn);
        assert_eq!(log_level(), LevelFilter::Warn);
        assert!(log_level_enabled(Level::Error));
        assert!(log_level_enabled(Level::Warn));
        assert!(!log_level_enabled(Level::Info));
        assert!(!log_level_enabled(Level::Trace));

        set_log_level(LevelFilter::Off);
        assert!(!log_level_enabled(Level::Error));

        set_log_level(LevelFilter::Trace);
        assert!(log_level_enabled(Level::Trace));

        set_log_level(LevelFilter::Info);

        #[cfg(feature = "sink")]
        sink_receives_messages();
    }

    #[test]
    fn macros_accept_target_and_plain_forms() {
        crate::log_trace!(target: "test", "value {}", 1);
        crate::log_debug!("value {}", 2);
        crate::log_warn!(target: "test", "plain");
    }

    #[cfg(feature = "sink")]
    fn sink_receives_messages() {
        use std::sync::Arc;

        #[derive(Default)]
        struct Capture(Mutex<Vec<String>>);

        impl Sink for Capture {
            fn write(&self, target: Option<&str>, level: Level, args: &fmt::Arguments<'_>) -> bool {
                if target == Some("sink-test") {
                    self.0.lock().unwrap().push(format!("{level} {args}"));
                    return true;
                }
                false
            }
        }

        let capture = Arc::new(Capture::default());
        pipe(Some(capture.clone()));
        crate::log_error!(target: "sink-test", "lost {} calls", 3);
        pipe(None);
        crate::log_error!(target: "sink-test", "not captured");

        assert_eq!(*capture.0.lock().unwrap(), vec!["ERROR lost 3 calls"]);
    }
}
