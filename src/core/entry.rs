//! Log entry structure

use super::field::Field;
use super::level::LogLevel;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::panic::Location;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// One record as handed to every sink of a fan-out
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub thread_id: String,
    pub thread_name: Option<String>,
    /// Call-site fields first, then any context-bound fields
    pub fields: Vec<Field>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: &str, fields: Vec<Field>) -> Self {
        Self {
            level,
            message: message.to_string(),
            timestamp: Utc::now(),
            file: None,
            line: None,
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            fields,
        }
    }

    pub fn with_location(mut self, location: &'static Location<'static>) -> Self {
        self.file = Some(location.file());
        self.line = Some(location.line());
        self
    }

    /// `file:line` of the call site, if captured
    pub fn caller(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }

    /// Fields that sinks should render, skip fields removed
    pub fn visible_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_skip())
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.visible_fields().find(|f| f.key() == key)
    }
}
