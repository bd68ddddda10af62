//! Long-running task helpers
//!
//! Tasks log through these helpers so their records share a `[<task>] `
//! message prefix and a `task` field.
//!
//! ```
//! use logger_facade::task::{self, Task};
//! use logger_facade::{Field, Logger};
//!
//! let logger = Logger::new();
//! logger.start_task();
//! task::log_info(&logger, "indexer", "batch done", [Field::uint("docs", 512)]);
//! logger.stop_task();
//! ```

use crate::core::logger::task_log_prefix;
use crate::core::sink::panic_message;
use crate::core::{Context, Field, Logger};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Something with a start/stop lifecycle
pub trait Task {
    fn start_task(&self);
    fn stop_task(&self);
}

impl Task for Logger {
    /// Starts with default options
    fn start_task(&self) {
        self.start([]);
    }

    fn stop_task(&self) {
        self.stop();
    }
}

fn with_task(task_name: &str, fields: impl IntoIterator<Item = Field>) -> Vec<Field> {
    let mut all: Vec<Field> = fields.into_iter().collect();
    all.push(Field::string("task", task_name));
    all
}

/// Same as [`log_debug`]
#[track_caller]
pub fn log_trace(logger: &Logger, task_name: &str, msg: &str, fields: impl IntoIterator<Item = Field>) {
    logger.trace(&task_log_prefix(task_name, msg), with_task(task_name, fields));
}

#[track_caller]
pub fn log_debug(logger: &Logger, task_name: &str, msg: &str, fields: impl IntoIterator<Item = Field>) {
    logger.debug(&task_log_prefix(task_name, msg), with_task(task_name, fields));
}

#[track_caller]
pub fn log_info(logger: &Logger, task_name: &str, msg: &str, fields: impl IntoIterator<Item = Field>) {
    logger.info(&task_log_prefix(task_name, msg), with_task(task_name, fields));
}

#[track_caller]
pub fn log_info_ignore_cancel(
    ctx: &Context,
    logger: &Logger,
    task_name: &str,
    msg: &str,
    fields: impl IntoIterator<Item = Field>,
) {
    if ctx.is_done() {
        return;
    }
    log_info(logger, task_name, msg, fields);
}

#[track_caller]
pub fn log_warn(logger: &Logger, task_name: &str, msg: &str, fields: impl IntoIterator<Item = Field>) {
    logger.warn(&task_log_prefix(task_name, msg), with_task(task_name, fields));
}

#[track_caller]
pub fn log_warn_ignore_cancel(
    ctx: &Context,
    logger: &Logger,
    task_name: &str,
    msg: &str,
    fields: impl IntoIterator<Item = Field>,
) {
    if ctx.is_done() {
        return;
    }
    log_warn(logger, task_name, msg, fields);
}

#[track_caller]
pub fn log_error(logger: &Logger, task_name: &str, msg: &str, fields: impl IntoIterator<Item = Field>) {
    logger.error(&task_log_prefix(task_name, msg), with_task(task_name, fields));
}

#[track_caller]
pub fn log_error_ignore_cancel(
    ctx: &Context,
    logger: &Logger,
    task_name: &str,
    msg: &str,
    fields: impl IntoIterator<Item = Field>,
) {
    if ctx.is_done() {
        return;
    }
    log_error(logger, task_name, msg, fields);
}

/// Run `f`, logging a panic instead of propagating it.
///
/// Returns `None` if `f` panicked. The record carries the panic payload as
/// `err` and the backtrace of the recovering thread as `stacktrace`.
pub fn catch_panic<F, R>(logger: &Logger, task_name: &str, f: F) -> Option<R>
where
    F: FnOnce() -> R,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            log_error(
                logger,
                task_name,
                "panic occurred",
                [
                    Field::string("err", panic_message(payload.as_ref())),
                    Field::stack("stacktrace"),
                ],
            );
            None
        }
    }
}
