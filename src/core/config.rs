//! Logger configuration snapshots
//!
//! A [`LoggerConfig`] is never mutated after it is published. Writers clone
//! it (a shallow copy: sink instances are shared through `Arc`), change the
//! clone and publish that. Readers holding the old snapshot keep a complete,
//! consistent view for as long as they hold it.

use super::{sampling::SamplingOptions, sink::SinkInstance};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_APP_SHORT_NAME: &str = "hello-world";

/// Process-wide options carried by a configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Short product name, used for the file sink's file name
    pub product_name_short: String,
    /// Sampling for the JSON stdout and file sinks; `None` disables it
    pub sampling: Option<SamplingOptions>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            product_name_short: DEFAULT_APP_SHORT_NAME.to_string(),
            sampling: None,
        }
    }
}

impl Options {
    /// Apply options in order; later options win
    pub fn apply<I>(&mut self, opts: I)
    where
        I: IntoIterator<Item = LoggingOption>,
    {
        for opt in opts {
            match opt {
                LoggingOption::ProductNameShort(name) => self.product_name_short = name,
                LoggingOption::Sampling(sampling) => self.sampling = Some(sampling),
            }
        }
    }
}

/// One option passed to [`Logger::start`](super::logger::Logger::start) or
/// [`Logger::add_sink`](super::logger::Logger::add_sink)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingOption {
    ProductNameShort(String),
    Sampling(SamplingOptions),
}

/// Sets the product name used in the log file name.
///
/// ```no_run
/// use logger_facade::{with_product_name_short, Logger};
///
/// let logger = Logger::new();
/// logger.start([with_product_name_short("your-product-name-here")]);
/// ```
pub fn with_product_name_short(name: impl Into<String>) -> LoggingOption {
    LoggingOption::ProductNameShort(name.into())
}

pub fn with_sampling(options: SamplingOptions) -> LoggingOption {
    LoggingOption::Sampling(options)
}

/// Immutable snapshot of sinks and options
#[derive(Debug, Clone, Default)]
pub struct LoggerConfig {
    sinks: HashMap<String, Arc<SinkInstance>>,
    options: Options,
}

impl LoggerConfig {
    pub fn new(options: Options) -> Self {
        Self {
            sinks: HashMap::new(),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub(crate) fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn sink(&self, name: &str) -> Option<&Arc<SinkInstance>> {
        self.sinks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sinks.contains_key(name)
    }

    /// Sinks in this snapshot. The order is unspecified but stable for the
    /// lifetime of the snapshot.
    pub fn sinks(&self) -> impl Iterator<Item = &Arc<SinkInstance>> {
        self.sinks.values()
    }

    pub fn sink_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sinks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Insert or replace a sink; only ever called on an unpublished clone
    pub(crate) fn insert(&mut self, sink: SinkInstance) {
        self.sinks.insert(sink.name().to_string(), Arc::new(sink));
    }
}
