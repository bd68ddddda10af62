//! Logger bound to a context's fields

use super::{
    context::{Context, ContextFields},
    field::Field,
    level::LogLevel,
    logger::Logger,
};
use std::sync::Arc;

/// A [`Logger`] plus the fields of the context it was obtained from.
///
/// Every record carries the call-site fields followed by the bound fields.
/// Bound fields are appended as they are; a call-site field with the same
/// key does not replace them.
#[derive(Debug, Clone)]
pub struct ContextLogger {
    logger: Arc<Logger>,
    fields: Option<ContextFields>,
}

impl ContextLogger {
    pub(crate) fn new(logger: Arc<Logger>, fields: Option<ContextFields>) -> Self {
        Self { logger, fields }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn fields(&self) -> Option<&ContextFields> {
        self.fields.as_ref()
    }

    fn with_bound(&self, fields: impl IntoIterator<Item = Field>) -> Vec<Field> {
        let mut all: Vec<Field> = fields.into_iter().collect();
        if let Some(bound) = &self.fields {
            all.extend(bound.iter().cloned());
        }
        all
    }

    #[track_caller]
    fn emit(&self, level: LogLevel, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.logger.emit(level, msg, self.with_bound(fields));
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(level, msg, fields);
    }

    #[track_caller]
    pub fn trace(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::Debug, msg, fields);
    }

    #[track_caller]
    pub fn debug(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::Debug, msg, fields);
    }

    #[track_caller]
    pub fn info(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::Info, msg, fields);
    }

    #[track_caller]
    pub fn info_ignore_cancel(
        &self,
        ctx: &Context,
        msg: &str,
        fields: impl IntoIterator<Item = Field>,
    ) {
        if !ctx.is_done() {
            self.emit(LogLevel::Info, msg, fields);
        }
    }

    #[track_caller]
    pub fn warn(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::Warn, msg, fields);
    }

    #[track_caller]
    pub fn warn_ignore_cancel(
        &self,
        ctx: &Context,
        msg: &str,
        fields: impl IntoIterator<Item = Field>,
    ) {
        if !ctx.is_done() {
            self.emit(LogLevel::Warn, msg, fields);
        }
    }

    #[track_caller]
    pub fn error(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::Error, msg, fields);
    }

    #[track_caller]
    pub fn error_ignore_cancel(
        &self,
        ctx: &Context,
        msg: &str,
        fields: impl IntoIterator<Item = Field>,
    ) {
        if !ctx.is_done() {
            self.emit(LogLevel::Error, msg, fields);
        }
    }

    #[track_caller]
    pub fn dpanic(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::DPanic, msg, fields);
    }

    #[track_caller]
    pub fn panic(&self, msg: &str, fields: impl IntoIterator<Item = Field>) -> ! {
        self.emit(LogLevel::Panic, msg, fields);
        unreachable!("panic level always unwinds")
    }

    #[track_caller]
    pub fn fatal(&self, msg: &str, fields: impl IntoIterator<Item = Field>) -> ! {
        self.emit(LogLevel::Fatal, msg, fields);
        unreachable!("fatal level always exits")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{appender::Appender, entry::LogEntry, error::Result};
    use parking_lot::Mutex;

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

    fn capturing() -> (Arc<Logger>, Arc<Mutex<Vec<LogEntry>>>) {
        let logger = Arc::new(Logger::new());
        let out = Arc::new(Mutex::new(Vec::new()));
        logger.add_appender("capture", Box::new(Capture(out.clone())), LogLevel::Debug, []);
        (logger, out)
    }

    #[test]
    fn test_call_site_fields_come_first() {
        let (logger, out) = capturing();
        let ctx = Context::background()
            .with_logger(logger)
            .with_fields([Field::string("request_id", "r-7")]);

        ctx.must_context_logger()
            .info("served", [Field::int("status", 200), Field::string("request_id", "local")]);

        let entries = out.lock();
        let keys: Vec<&str> = entries[0].fields.iter().map(Field::key).collect();
        assert_eq!(keys, vec!["status", "request_id", "request_id"]);
        assert_eq!(entries[0].fields[2], Field::string("request_id", "r-7"));
    }

    #[test]
    fn test_ignore_cancel_skips_done_context() {
        let (logger, out) = capturing();
        let (ctx, cancel) = Context::background().with_logger(logger).with_cancel();
        let log = ctx.must_context_logger();

        log.warn_ignore_cancel(&ctx, "before", []);
        cancel.cancel();
        log.warn_ignore_cancel(&ctx, "after", []);
        log.error_ignore_cancel(&ctx, "after", []);

        let messages: Vec<String> = out.lock().iter().map(|e| e.message.clone()).collect();
        assert_eq!(messages, vec!["before".to_string()]);
    }

    #[test]
    fn test_trace_is_debug() {
        let (logger, out) = capturing();
        let log = Context::background().with_logger(logger).must_context_logger();
        log.trace("t", []);
        assert_eq!(out.lock()[0].level, LogLevel::Debug);
    }

    #[test]
    fn test_caller_points_at_call_site() {
        let (logger, out) = capturing();
        let log = Context::background().with_logger(logger).must_context_logger();
        log.info("where", []);
        assert_eq!(out.lock()[0].file, Some(file!()));
    }
}
