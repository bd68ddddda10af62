//! Human-readable console appender
//!
//! Tab-separated lines: local timestamp, level, caller, message and the
//! fields as a JSON object. Records at or above the stacktrace level get
//! the captured backtrace on the following lines, when `RUST_BACKTRACE`
//! enables capturing.

use crate::core::{Appender, LogEntry, LogLevel, Result};
use chrono::Local;
#[cfg(feature = "console")]
use colored::Colorize;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::io::{self, Write};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f UTC%:z";

/// Escape line breaks and tabs so one record stays on one line and the
/// column separators stay unambiguous
fn escape_message(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

pub struct ConsoleAppender {
    use_colors: bool,
    stacktrace_level: Option<LogLevel>,
    writer: Box<dyn Write + Send>,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
            stacktrace_level: Some(LogLevel::Warn),
            writer: Box::new(io::stdout()),
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors && cfg!(feature = "console");
        self
    }

    /// Attach a backtrace to records at or above `level`; `None` never does
    #[must_use]
    pub fn with_stacktrace_level(mut self, level: Option<LogLevel>) -> Self {
        self.stacktrace_level = level;
        self
    }

    /// Write somewhere other than stdout
    #[must_use]
    pub fn with_writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.writer = Box::new(writer);
        self
    }

    #[cfg(feature = "console")]
    fn level_text(&self, level: LogLevel) -> String {
        if self.use_colors {
            level.to_str().color(level.color_code()).to_string()
        } else {
            level.to_str().to_string()
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_text(&self, level: LogLevel) -> String {
        level.to_str().to_string()
    }

    fn format_text(&self, entry: &LogEntry) -> String {
        let timestamp = entry
            .timestamp
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT);

        let mut line = format!("{}\t{}", timestamp, self.level_text(entry.level));
        if let Some(caller) = entry.caller() {
            line.push('\t');
            line.push_str(&caller);
        }
        line.push('\t');
        line.push_str(&escape_message(&entry.message));

        let fields: serde_json::Map<String, serde_json::Value> = entry
            .visible_fields()
            .map(|f| (f.key().to_string(), f.value().to_json_value()))
            .collect();
        if !fields.is_empty() {
            line.push('\t');
            line.push_str(&serde_json::Value::Object(fields).to_string());
        }
        line
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let mut output = self.format_text(entry);

        if self.stacktrace_level.is_some_and(|min| entry.level >= min) {
            let backtrace = Backtrace::capture();
            if backtrace.status() == BacktraceStatus::Captured {
                output.push('\n');
                output.push_str(&backtrace.to_string());
            }
        }

        output.push('\n');
        self.writer.write_all(output.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }

    fn is_development(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Field;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_plain_line_layout() -> Result<()> {
        let out = Shared::default();
        let mut appender = ConsoleAppender::new()
            .with_colors(false)
            .with_stacktrace_level(None)
            .with_writer(out.clone());

        let entry = LogEntry::new(
            LogLevel::Warn,
            "disk almost full",
            vec![Field::uint("free_mb", 12)],
        );
        appender.append(&entry)?;

        let text = String::from_utf8(out.0.lock().clone()).unwrap();
        let columns: Vec<&str> = text.trim_end().split('\t').collect();
        assert_eq!(columns.len(), 4);
        assert!(columns[0].contains(" UTC"));
        assert_eq!(columns[1], "WARN");
        assert_eq!(columns[2], "disk almost full");
        assert_eq!(columns[3], r#"{"free_mb":12}"#);
        Ok(())
    }

    #[test]
    fn test_message_cannot_break_the_line() -> Result<()> {
        let out = Shared::default();
        let mut appender = ConsoleAppender::new()
            .with_colors(false)
            .with_stacktrace_level(None)
            .with_writer(out.clone());

        let entry = LogEntry::new(
            LogLevel::Info,
            "User login\nERROR fake\tcolumn\r",
            Vec::new(),
        );
        appender.append(&entry)?;

        let text = String::from_utf8(out.0.lock().clone()).unwrap();
        assert_eq!(text.lines().count(), 1);
        let columns: Vec<&str> = text.trim_end().split('\t').collect();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[2], "User login\\nERROR fake\\tcolumn\\r");
        Ok(())
    }

    #[test]
    fn test_is_development() {
        assert!(ConsoleAppender::new().is_development());
    }
}
