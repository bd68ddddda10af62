//! Sink writer trait
//!
//! An appender is the output half of a sink: it renders a record and does
//! its own I/O. Level gating, enable flags and sampling live in
//! [`SinkInstance`](super::sink::SinkInstance), not here.

use super::{error::Result, entry::LogEntry};

pub trait Appender: Send {
    fn append(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;

    /// Development appenders turn `dpanic` records into panics.
    fn is_development(&self) -> bool {
        false
    }
}
