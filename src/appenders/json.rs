//! JSON-lines appender
//!
//! Writes each record as one JSON object per line (JSONL), compatible with
//! log aggregation tools like ELK, Loki, etc. Keys come in a fixed order:
//! `level`, `ts`, `caller` (when known), `msg`, then the record's fields in
//! the order they were given. Repeated field keys are written as they are.

use crate::core::{Appender, LogEntry, Result};
use chrono::SecondsFormat;
use std::io::{self, Write};

/// Render `entry` as a single JSON line, without the trailing newline
pub(crate) fn encode_line(entry: &LogEntry) -> Result<String> {
    let mut line = String::with_capacity(128 + entry.message.len());
    line.push_str("{\"level\":");
    line.push_str(&serde_json::to_string(entry.level.as_lowercase())?);
    line.push_str(",\"ts\":");
    line.push_str(&serde_json::to_string(
        &entry.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
    )?);
    if let Some(caller) = entry.caller() {
        line.push_str(",\"caller\":");
        line.push_str(&serde_json::to_string(&caller)?);
    }
    line.push_str(",\"msg\":");
    line.push_str(&serde_json::to_string(&entry.message)?);

    for field in entry.visible_fields() {
        line.push(',');
        line.push_str(&serde_json::to_string(field.key())?);
        line.push(':');
        line.push_str(&serde_json::to_string(&field.value().to_json_value())?);
    }
    line.push('}');
    Ok(line)
}

/// JSON appender over any writer
///
/// Each record is written with a single `write_all`, so lines from
/// different records never interleave on the underlying writer.
pub struct JsonAppender {
    writer: Box<dyn Write + Send>,
}

impl JsonAppender {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Appender for the process's standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Appender for JsonAppender {
    fn name(&self) -> &str {
        "json"
    }

    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let mut line = encode_line(entry)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
