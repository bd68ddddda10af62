//! Core logger types and the facade

pub mod appender;
pub mod config;
pub mod context;
pub mod context_logger;
pub mod entry;
pub mod error;
pub mod field;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod sampling;
pub mod settings;
pub mod sink;

pub use appender::Appender;
pub use config::{
    with_product_name_short, with_sampling, LoggerConfig, LoggingOption, Options,
    DEFAULT_APP_SHORT_NAME,
};
pub use context::{
    attach_logger, context_logger, context_logger_must, propagate_logging_state, with_fields,
    CancellationToken, Context, ContextFields,
};
pub use context_logger::ContextLogger;
pub use entry::LogEntry;
pub use error::{ContextError, LoggerError, Result};
pub use field::{Field, FieldValue};
pub use level::{AtomicLevel, LogLevel};
pub use logger::{Logger, DEBUG_CONSOLE_SINK, FILE_SINK, JSON_STDOUT_SINK};
pub use metrics::SinkMetrics;
pub use sampling::{LogSampler, SamplerMetrics, SamplingOptions};
pub use settings::{LoggingSettings, SinkSettings};
pub use sink::SinkInstance;
