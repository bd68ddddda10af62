//! Built-in sink writers

pub mod console;
pub mod json;
pub mod rotating_file;

pub use console::ConsoleAppender;
pub use json::JsonAppender;
pub use rotating_file::{RotatingFileAppender, RotationPolicy};

pub use crate::core::Appender;
