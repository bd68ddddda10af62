//! Named sink instances
//!
//! A [`SinkInstance`] bundles an appender with an enable flag and a minimum
//! level. Both knobs are atomics, so they can be flipped through a shared
//! reference while other threads are logging, without republishing the
//! logger configuration.

use super::{
    appender::Appender,
    entry::LogEntry,
    level::{AtomicLevel, LogLevel},
    metrics::SinkMetrics,
    sampling::{LogSampler, SamplingOptions},
};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

pub struct SinkInstance {
    name: String,
    enabled: AtomicBool,
    level: AtomicLevel,
    development: bool,
    sampler: Option<LogSampler>,
    writer: Mutex<Box<dyn Appender>>,
    metrics: SinkMetrics,
}

impl SinkInstance {
    pub fn new(
        name: impl Into<String>,
        appender: Box<dyn Appender>,
        level: LogLevel,
        enabled: bool,
    ) -> Self {
        let development = appender.is_development();
        Self {
            name: name.into(),
            enabled: AtomicBool::new(enabled),
            level: AtomicLevel::new(level),
            development,
            sampler: None,
            writer: Mutex::new(appender),
            metrics: SinkMetrics::new(),
        }
    }

    #[must_use]
    pub fn with_sampling(mut self, options: Option<SamplingOptions>) -> Self {
        self.sampler = options.map(LogSampler::new);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level.get()
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.set(level);
    }

    /// Whether a record at `level` would pass this sink's level gate
    #[inline]
    pub fn admits(&self, level: LogLevel) -> bool {
        self.level.enabled(level)
    }

    pub fn is_development(&self) -> bool {
        self.development
    }

    pub fn sampler(&self) -> Option<&LogSampler> {
        self.sampler.as_ref()
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Level-gate, sample, then hand the record to the appender.
    ///
    /// Returns `true` if the appender accepted it. Appender errors and
    /// panics are reported to stderr and never reach the caller.
    pub fn write(&self, entry: &LogEntry) -> bool {
        if !self.admits(entry.level) {
            self.metrics.record_filtered();
            return false;
        }
        if let Some(sampler) = &self.sampler {
            if !sampler.should_sample(entry.level, &entry.message) {
                self.metrics.record_sampled_out();
                return false;
            }
        }

        let mut writer = self.writer.lock();
        let result = catch_unwind(AssertUnwindSafe(|| writer.append(entry)));
        match result {
            Ok(Ok(())) => {
                self.metrics.record_written();
                true
            }
            Ok(Err(e)) => {
                eprintln!("[LOGGER ERROR] Sink '{}' failed: {}", self.name, e);
                self.metrics.record_failed();
                false
            }
            Err(panic_info) => {
                eprintln!(
                    "[LOGGER CRITICAL] Sink '{}' panicked: {}. \
                     Other sinks continue to function.",
                    self.name,
                    panic_message(panic_info.as_ref())
                );
                self.metrics.record_failed();
                false
            }
        }
    }

    /// Best-effort drain; failures are reported and swallowed
    pub fn flush(&self) {
        let mut writer = self.writer.lock();
        match catch_unwind(AssertUnwindSafe(|| writer.flush())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                eprintln!("[LOGGER ERROR] Sink '{}' flush failed: {}", self.name, e);
            }
            Err(panic_info) => {
                eprintln!(
                    "[LOGGER CRITICAL] Sink '{}' panicked during flush: {}",
                    self.name,
                    panic_message(panic_info.as_ref())
                );
            }
        }
    }
}

impl fmt::Debug for SinkInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkInstance")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .field("level", &self.level())
            .field("development", &self.development)
            .field("sampler", &self.sampler)
            .finish()
    }
}

pub(crate) fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{LoggerError, Result};
    use std::sync::Arc;

    struct Collect(Arc<Mutex<Vec<String>>>);

    impl Appender for Collect {
        fn append(&mut self, entry: &LogEntry) -> Result<()> {
            self.0.lock().push(entry.message.clone());
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "collect"
        }
    }

    struct Broken;

    impl Appender for Broken {
        fn append(&mut self, _entry: &LogEntry) -> Result<()> {
            Err(LoggerError::file_appender("pipe", "closed"))
        }
        fn flush(&mut self) -> Result<()> {
            panic!("flush exploded")
        }
        fn name(&self) -> &str {
            "broken"
        }
    }

    fn entry(level: LogLevel, msg: &str) -> LogEntry {
        LogEntry::new(level, msg, Vec::new())
    }

    #[test]
    fn test_level_gate() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let sink = SinkInstance::new("c", Box::new(Collect(out.clone())), LogLevel::Warn, true);

        assert!(!sink.write(&entry(LogLevel::Info, "quiet")));
        assert!(sink.write(&entry(LogLevel::Error, "loud")));
        assert_eq!(*out.lock(), vec!["loud".to_string()]);
        assert_eq!(sink.metrics().filtered_count(), 1);

        sink.set_level(LogLevel::Debug);
        assert!(sink.write(&entry(LogLevel::Debug, "now visible")));
    }

    #[test]
    fn test_sampling_applies() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let sink = SinkInstance::new("c", Box::new(Collect(out.clone())), LogLevel::Debug, true)
            .with_sampling(Some(SamplingOptions {
                tick: std::time::Duration::from_secs(60),
                first: 1,
                thereafter: 0,
            }));

        sink.write(&entry(LogLevel::Info, "same"));
        sink.write(&entry(LogLevel::Info, "same"));
        assert_eq!(out.lock().len(), 1);
        assert_eq!(sink.metrics().sampled_out_count(), 1);
    }

    #[test]
    fn test_failures_are_contained() {
        let sink = SinkInstance::new("b", Box::new(Broken), LogLevel::Debug, true);
        assert!(!sink.write(&entry(LogLevel::Error, "lost")));
        assert_eq!(sink.metrics().failed_count(), 1);

        // must not propagate the panic
        sink.flush();
    }

    #[test]
    fn test_enable_toggle() {
        let sink = SinkInstance::new("b", Box::new(Broken), LogLevel::Debug, false);
        assert!(!sink.is_enabled());
        sink.set_enabled(true);
        assert!(sink.is_enabled());
    }
}
