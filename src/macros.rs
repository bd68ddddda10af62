//! Structured logging macros.
//!
//! Each macro takes a logger (a [`Logger`](crate::Logger), a
//! [`ContextLogger`](crate::ContextLogger), or anything that derefs to one),
//! a message, and any number of `key => value` pairs. Values go through
//! [`Field::new`](crate::Field::new), so anything convertible into a
//! [`FieldValue`](crate::FieldValue) works.
//!
//! # Examples
//!
//! ```
//! use logger_facade::{info, warn, Logger};
//!
//! let logger = Logger::new();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080u16;
//! info!(logger, "Server listening", "port" => port, "tls" => false);
//!
//! warn!(logger, "Slow request", "path" => "/search", "elapsed_ms" => 1250);
//! ```

/// Log at an explicit level.
///
/// ```
/// # use logger_facade::{Logger, LogLevel};
/// # let logger = Logger::new();
/// use logger_facade::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Request failed", "status" => 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.log(
            $level,
            $msg,
            [$($crate::Field::new($key, $value)),*],
        )
    };
}

/// Log at debug level; there is no separate trace level.
///
/// ```
/// # use logger_facade::Logger;
/// # let logger = Logger::new();
/// use logger_facade::trace;
/// trace!(logger, "Entering function", "fn" => "calculate");
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// # use logger_facade::Logger;
/// # let logger = Logger::new();
/// use logger_facade::error;
/// let err = std::io::Error::other("connection reset");
/// error!(logger, "Upstream failed", "error" => err.to_string(), "retries" => 3);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Panics after logging when no sink took the record or a development sink did.
#[macro_export]
macro_rules! dpanic {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::DPanic, $($arg)+)
    };
}

/// Logs, then panics with the message.
#[macro_export]
macro_rules! panic_log {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Panic, $($arg)+)
    };
}

/// Logs, then exits the process with status 1.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Appender, LogEntry, LogLevel, Logger, Result};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Capture(Arc<Mutex<Vec<LogEntry>>>);

    impl Appender for Capture {
        fn append(&mut self, entry: &LogEntry) -> Result<()> {
            self.0.lock().push(entry.clone());
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "capture"
        }
    }

    #[test]
    fn test_macros_build_fields_in_order() {
        let logger = Logger::new();
        let out = Arc::new(Mutex::new(Vec::new()));
        logger.add_appender("capture", Box::new(Capture(out.clone())), LogLevel::Debug, []);

        trace!(logger, "t");
        info!(logger, "request", "user_id" => 42, "path" => "/home",);
        warn!(&logger, "slow", "ms" => 1.5);

        let entries = out.lock();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].level, LogLevel::Debug);
        assert!(entries[0].fields.is_empty());

        let keys: Vec<&str> = entries[1].fields.iter().map(|f| f.key()).collect();
        assert_eq!(keys, vec!["user_id", "path"]);
        assert_eq!(entries[1].file, Some(file!()));
        assert_eq!(entries[2].level, LogLevel::Warn);
    }

    #[test]
    #[should_panic(expected = "fell over")]
    fn test_panic_log_macro() {
        let logger = Logger::new();
        panic_log!(logger, "fell over", "attempt" => 3);
    }
}
