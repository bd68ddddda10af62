//! The logging facade
//!
//! [`Logger`] owns an atomically swappable pointer to the current
//! [`LoggerConfig`]. Every log call loads the snapshot once and fans the
//! record out to each enabled sink in it. Loads never block; configuration
//! changes clone the snapshot, modify the clone and publish it, so an
//! in-flight call keeps seeing the snapshot it started with.

use super::{
    appender::Appender,
    config::{LoggerConfig, LoggingOption, Options},
    context::Context,
    entry::LogEntry,
    field::Field,
    level::LogLevel,
    sink::SinkInstance,
};
use crate::appenders::{ConsoleAppender, JsonAppender, RotatingFileAppender, RotationPolicy};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Name of the colored, human-readable stdout sink
pub const DEBUG_CONSOLE_SINK: &str = "debug-console";
/// Name of the JSON-lines stdout sink
pub const JSON_STDOUT_SINK: &str = "json-stdout";
/// Name of the rotating file sink
pub const FILE_SINK: &str = "file";

const BUILT_IN_SINKS: [&str; 3] = [FILE_SINK, DEBUG_CONSOLE_SINK, JSON_STDOUT_SINK];
const TASK_NAME: &str = "Logging Service";

static INSTANCE: OnceLock<Arc<Logger>> = OnceLock::new();

/// Result of one fan-out
#[derive(Debug, Default, Clone, Copy)]
struct Dispatch {
    /// Enabled sinks the record was handed to
    forwarded: usize,
    /// Whether any of them runs in development mode
    development: bool,
}

pub struct Logger {
    config: ArcSwap<LoggerConfig>,
    /// Serializes clone-mutate-publish sequences. Readers never take it.
    publish_lock: Mutex<()>,
    /// Start/stop guard, held across the (comparatively slow) sink construction
    started: Mutex<bool>,
}

impl Logger {
    /// A logger with no sinks and default options
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    #[must_use]
    pub fn with_options(options: Options) -> Self {
        Self {
            config: ArcSwap::from_pointee(LoggerConfig::new(options)),
            publish_lock: Mutex::new(()),
            started: Mutex::new(false),
        }
    }

    /// Process-wide default logger, created on first use.
    #[deprecated(
        since = "0.1.0",
        note = "construct a Logger once and pass it explicitly or through a Context"
    )]
    pub fn instance() -> Arc<Logger> {
        Arc::clone(INSTANCE.get_or_init(|| Arc::new(Logger::new())))
    }

    /// The currently published configuration snapshot
    pub fn config(&self) -> Arc<LoggerConfig> {
        self.config.load_full()
    }

    /// Clone the current snapshot, let `mutate` change it and publish the
    /// result. `mutate` returns `false` to abandon the change.
    fn update(&self, mutate: impl FnOnce(&mut LoggerConfig) -> bool) {
        let _guard = self.publish_lock.lock();
        let mut next = LoggerConfig::clone(&self.config.load());
        if mutate(&mut next) {
            self.config.store(Arc::new(next));
        }
    }

    /// Provision the built-in console, JSON stdout and file sinks.
    ///
    /// All three start disabled. Calling `start` on a started logger is a
    /// no-op, options included.
    pub fn start<I>(&self, opts: I)
    where
        I: IntoIterator<Item = LoggingOption>,
    {
        {
            let mut started = self.started.lock();
            if *started {
                return;
            }

            self.update(|cfg| {
                cfg.options_mut().apply(opts);
                let sampling = cfg.options().sampling;

                cfg.insert(SinkInstance::new(
                    DEBUG_CONSOLE_SINK,
                    Box::new(ConsoleAppender::new()),
                    LogLevel::Info,
                    false,
                ));

                cfg.insert(
                    SinkInstance::new(
                        JSON_STDOUT_SINK,
                        Box::new(JsonAppender::stdout()),
                        LogLevel::Info,
                        false,
                    )
                    .with_sampling(sampling),
                );

                let path = log_file_path(&cfg.options().product_name_short);
                cfg.insert(
                    SinkInstance::new(
                        FILE_SINK,
                        Box::new(RotatingFileAppender::with_policy(
                            path,
                            RotationPolicy::default(),
                        )),
                        LogLevel::Error,
                        false,
                    )
                    .with_sampling(sampling),
                );
                true
            });

            *started = true;
        }
        self.info(&task_log_prefix(TASK_NAME, "started"), []);
    }

    /// Flush every sink and mark the logger stopped. Idempotent.
    pub fn stop(&self) {
        {
            let mut started = self.started.lock();
            if !*started {
                return;
            }
            *started = false;
        }
        self.info(&task_log_prefix(TASK_NAME, "stopped"), []);
        self.sync();
    }

    pub fn is_started(&self) -> bool {
        *self.started.lock()
    }

    /// Flush all sinks, swallowing failures
    pub fn sync(&self) {
        let cfg = self.config.load();
        for sink in cfg.sinks() {
            sink.flush();
        }
    }

    /// Add a JSON sink writing to `writer`. Enabled on creation.
    ///
    /// A sink with the same name already present makes this a no-op; the
    /// existing sink's writer and level are left untouched.
    pub fn add_sink<W, I>(&self, name: impl Into<String>, writer: W, level: LogLevel, opts: I)
    where
        W: Write + Send + 'static,
        I: IntoIterator<Item = LoggingOption>,
    {
        self.add_appender(name, Box::new(JsonAppender::new(writer)), level, opts);
    }

    /// Add a sink backed by any [`Appender`]. Same no-op rule as [`Logger::add_sink`].
    pub fn add_appender<I>(
        &self,
        name: impl Into<String>,
        appender: Box<dyn Appender>,
        level: LogLevel,
        opts: I,
    ) where
        I: IntoIterator<Item = LoggingOption>,
    {
        let name = name.into();
        if self.config.load().contains(&name) {
            return;
        }

        let mut sink_options = Options::default();
        sink_options.apply(opts);

        self.update(|cfg| {
            // re-check under the publish lock
            if cfg.contains(&name) {
                return false;
            }
            cfg.insert(
                SinkInstance::new(name, appender, level, true).with_sampling(sink_options.sampling),
            );
            true
        });
    }

    pub fn sink(&self, name: &str) -> Option<Arc<SinkInstance>> {
        self.config.load().sink(name).cloned()
    }

    /// Enable or disable a sink in place. Unknown names are ignored.
    pub fn set_sink_enabled(&self, name: &str, enabled: bool) {
        if let Some(sink) = self.config.load().sink(name) {
            sink.set_enabled(enabled);
        }
    }

    /// Change a sink's minimum level in place. Unknown names are ignored.
    pub fn set_log_level(&self, name: &str, level: LogLevel) {
        if let Some(sink) = self.config.load().sink(name) {
            sink.set_level(level);
        }
    }

    pub fn set_console_logging(&self, enabled: bool) {
        self.set_sink_enabled(DEBUG_CONSOLE_SINK, enabled);
    }

    pub fn set_json_stdout_logging(&self, enabled: bool) {
        self.set_sink_enabled(JSON_STDOUT_SINK, enabled);
    }

    pub fn set_file_logging(&self, enabled: bool) {
        self.set_sink_enabled(FILE_SINK, enabled);
    }

    pub fn set_console_log_level(&self, level: LogLevel) {
        self.set_log_level(DEBUG_CONSOLE_SINK, level);
    }

    pub fn set_json_stdout_log_level(&self, level: LogLevel) {
        self.set_log_level(JSON_STDOUT_SINK, level);
    }

    pub fn set_file_log_level(&self, level: LogLevel) {
        self.set_log_level(FILE_SINK, level);
    }

    /// Whether some enabled sink would emit a record at `level`
    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        self.config
            .load()
            .sinks()
            .any(|sink| sink.is_enabled() && sink.admits(level))
    }

    /// Report a failure inside a caller-supplied sink writer.
    ///
    /// Only the built-in sinks receive it, so a broken custom sink cannot
    /// feed its own errors back into itself.
    #[track_caller]
    pub fn error_in_sink_writer(&self, args: fmt::Arguments<'_>) {
        let location = Location::caller();
        let cfg = self.config.load();
        let entry = LogEntry::new(LogLevel::Error, &args.to_string(), Vec::new())
            .with_location(location);
        for name in BUILT_IN_SINKS {
            if let Some(sink) = cfg.sink(name) {
                if sink.is_enabled() {
                    sink.write(&entry);
                }
            }
        }
    }

    #[track_caller]
    pub fn error_in_sink_writer_ignore_cancel(&self, ctx: &Context, args: fmt::Arguments<'_>) {
        if ctx.is_done() {
            return;
        }
        self.error_in_sink_writer(args);
    }

    /// Fan a record out to every enabled sink of one snapshot
    fn dispatch(
        &self,
        level: LogLevel,
        msg: &str,
        fields: Vec<Field>,
        location: &'static Location<'static>,
    ) -> Dispatch {
        let cfg = self.config.load();
        let mut outcome = Dispatch::default();
        let mut fields = Some(fields);
        let mut entry: Option<LogEntry> = None;

        for sink in cfg.sinks() {
            if !sink.is_enabled() {
                continue;
            }
            outcome.forwarded += 1;
            outcome.development |= sink.is_development();

            let entry = entry.get_or_insert_with(|| {
                LogEntry::new(level, msg, fields.take().unwrap_or_default()).with_location(location)
            });
            sink.write(entry);
        }
        outcome
    }

    /// Dispatch, then apply the terminal effect of dpanic/panic/fatal.
    #[track_caller]
    pub(crate) fn emit(&self, level: LogLevel, msg: &str, fields: Vec<Field>) {
        let outcome = self.dispatch(level, msg, fields, Location::caller());
        if !level.is_terminal() {
            return;
        }

        match level {
            LogLevel::DPanic => {
                if outcome.forwarded == 0 || outcome.development {
                    self.sync();
                    panic!("{}", msg);
                }
            }
            LogLevel::Panic => {
                self.sync();
                panic!("{}", msg);
            }
            LogLevel::Fatal => {
                if outcome.forwarded == 0 {
                    println!("{}", msg);
                    let _ = std::io::stdout().flush();
                } else {
                    self.sync();
                }
                std::process::exit(1);
            }
            _ => {}
        }
    }

    /// Log at an explicit level, terminal effects included.
    #[track_caller]
    pub fn log(&self, level: LogLevel, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(level, msg, fields.into_iter().collect());
    }

    /// Same as [`Logger::debug`]; there is no separate trace level.
    #[track_caller]
    pub fn trace(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::Debug, msg, fields.into_iter().collect());
    }

    #[track_caller]
    pub fn debug(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::Debug, msg, fields.into_iter().collect());
    }

    #[track_caller]
    pub fn info(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::Info, msg, fields.into_iter().collect());
    }

    /// [`Logger::info`], unless `ctx` is already cancelled or past its deadline
    #[track_caller]
    pub fn info_ignore_cancel(
        &self,
        ctx: &Context,
        msg: &str,
        fields: impl IntoIterator<Item = Field>,
    ) {
        if ctx.is_done() {
            return;
        }
        self.info(msg, fields);
    }

    #[track_caller]
    pub fn warn(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::Warn, msg, fields.into_iter().collect());
    }

    #[track_caller]
    pub fn warn_ignore_cancel(
        &self,
        ctx: &Context,
        msg: &str,
        fields: impl IntoIterator<Item = Field>,
    ) {
        if ctx.is_done() {
            return;
        }
        self.warn(msg, fields);
    }

    #[track_caller]
    pub fn error(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::Error, msg, fields.into_iter().collect());
    }

    #[track_caller]
    pub fn error_ignore_cancel(
        &self,
        ctx: &Context,
        msg: &str,
        fields: impl IntoIterator<Item = Field>,
    ) {
        if ctx.is_done() {
            return;
        }
        self.error(msg, fields);
    }

    /// Logs, then panics if no sink took the record or a development sink did.
    #[track_caller]
    pub fn dpanic(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(LogLevel::DPanic, msg, fields.into_iter().collect());
    }

    /// Logs, then panics with `msg` as the payload.
    #[track_caller]
    pub fn panic(&self, msg: &str, fields: impl IntoIterator<Item = Field>) -> ! {
        self.emit(LogLevel::Panic, msg, fields.into_iter().collect());
        unreachable!("panic level always unwinds")
    }

    /// Logs, then exits the process with status 1. With no enabled sink the
    /// message is printed straight to stdout first.
    #[track_caller]
    pub fn fatal(&self, msg: &str, fields: impl IntoIterator<Item = Field>) -> ! {
        self.emit(LogLevel::Fatal, msg, fields.into_iter().collect());
        unreachable!("fatal level always exits")
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config.load())
            .field("started", &self.is_started())
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.sync();
    }
}

/// `<dir of current executable>/<product>.log`, or a relative path if the
/// executable can't be located
fn log_file_path(product_name_short: &str) -> PathBuf {
    let file_name = format!("{}.log", product_name_short);
    match std::env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join(&file_name))
            .unwrap_or_else(|| PathBuf::from(&file_name)),
        Err(e) => {
            eprintln!(
                "[LOGGER ERROR] Cannot resolve executable directory for log file, using '{}': {}",
                file_name, e
            );
            PathBuf::from(file_name)
        }
    }
}

pub(crate) fn task_log_prefix(task_name: &str, msg: &str) -> String {
    let mut prefixed = String::with_capacity(task_name.len() + msg.len() + 3);
    prefixed.push('[');
    prefixed.push_str(task_name);
    prefixed.push_str("] ");
    prefixed.push_str(msg);
    prefixed
}
