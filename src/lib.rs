//! # Logger Facade
//!
//! A structured logging facade that fans each record out to a set of named,
//! independently configured sinks.
//!
//! ## Features
//!
//! - **Lock-free reads**: log calls load an immutable configuration snapshot;
//!   adding sinks publishes a new one
//! - **Runtime knobs**: enable/disable and re-level any sink while other
//!   threads are logging
//! - **Built-in sinks**: colored console, JSON stdout and a rotating JSON file
//! - **Context propagation**: bind a logger and fields to a [`Context`] and
//!   log with them further down the call chain
//! - **Cancellation aware**: `*_ignore_cancel` calls stay quiet once the
//!   caller's context is done
//!
//! ```
//! use logger_facade::prelude::*;
//!
//! let logger = Logger::new();
//! logger.start([with_product_name_short("billing")]);
//! logger.set_console_logging(true);
//!
//! logger.info("invoice sent", [Field::uint("invoice", 1042)]);
//! logger.stop();
//! ```

pub mod appenders;
pub mod core;
pub mod macros;
pub mod task;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, JsonAppender, RotatingFileAppender, RotationPolicy};
    pub use crate::core::{
        with_product_name_short, with_sampling, Appender, CancellationToken, Context,
        ContextError, ContextLogger, Field, FieldValue, LogEntry, LogLevel, Logger, LoggerError,
        LoggingOption, LoggingSettings, Result, SamplingOptions,
    };
    pub use crate::task::Task;
}

pub use appenders::{ConsoleAppender, JsonAppender, RotatingFileAppender, RotationPolicy};
pub use core::{
    attach_logger, context_logger, context_logger_must, propagate_logging_state, with_fields,
    with_product_name_short, with_sampling, Appender, AtomicLevel, CancellationToken, Context,
    ContextError, ContextFields, ContextLogger, Field, FieldValue, LogEntry, LogLevel, LogSampler,
    Logger, LoggerConfig, LoggerError, LoggingOption, LoggingSettings, Options, Result,
    SamplerMetrics, SamplingOptions, SinkInstance, SinkMetrics, SinkSettings,
    DEBUG_CONSOLE_SINK, DEFAULT_APP_SHORT_NAME, FILE_SINK, JSON_STDOUT_SINK,
};
pub use task::Task;
