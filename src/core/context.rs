//! Request-scoped context carrying a logger, bound fields and cancellation
//!
//! A [`Context`] is a cheap-to-clone, persistent value: every `with_*`
//! method returns a new context and leaves the receiver untouched. Values
//! are inherited by derived contexts, so a logger attached near the root of
//! a request is visible to everything spawned from it.
//!
//! ```
//! use logger_facade::{Context, Field, Logger};
//! use std::sync::Arc;
//!
//! let logger = Arc::new(Logger::new());
//! let ctx = Context::background()
//!     .with_logger(logger)
//!     .with_fields([Field::string("request_id", "r-1")]);
//!
//! let log = ctx.context_logger().unwrap();
//! log.info("handling request", [Field::int("attempt", 1)]);
//! ```

use super::{
    context_logger::ContextLogger,
    error::{ContextError, LoggerError, Result},
    field::Field,
    logger::Logger,
};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
pub use tokio_util::sync::CancellationToken;

/// Immutable, ordered set of fields bound to a context
#[derive(Clone, Default, PartialEq)]
pub struct ContextFields(Arc<[Field]>);

impl ContextFields {
    /// Merge `incoming` into a new set.
    ///
    /// A key already present is replaced in place, keeping its position.
    /// New keys are appended in the order given. If `incoming` repeats a
    /// key, the last occurrence wins but sits where the first one landed.
    /// Skip fields carry nothing and are dropped.
    pub fn merge<I>(&self, incoming: I) -> ContextFields
    where
        I: IntoIterator<Item = Field>,
    {
        let mut merged: Vec<Field> = self.0.to_vec();
        for field in incoming {
            if field.is_skip() {
                continue;
            }
            match merged.iter_mut().find(|f| f.key() == field.key()) {
                Some(existing) => *existing = field,
                None => merged.push(field),
            }
        }
        ContextFields(merged.into())
    }

    pub fn as_slice(&self) -> &[Field] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.0.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.0.iter().find(|f| f.key() == key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ContextFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a ContextFields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Default)]
pub struct Context {
    logger: Option<Arc<Logger>>,
    fields: Option<ContextFields>,
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl Context {
    /// The empty root context: no logger, no fields, never done
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that is done once the returned token is cancelled
    /// or this context is done.
    pub fn with_cancel(&self) -> (Context, CancellationToken) {
        let token = match &self.cancel {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let ctx = Context {
            cancel: Some(token.clone()),
            ..self.clone()
        };
        (ctx, token)
    }

    /// Derive a cancellable context that is also done at `deadline`. An
    /// earlier inherited deadline is kept.
    pub fn with_deadline(&self, deadline: Instant) -> (Context, CancellationToken) {
        let (mut ctx, token) = self.with_cancel();
        ctx.deadline = Some(match self.deadline {
            Some(inherited) => inherited.min(deadline),
            None => deadline,
        });
        (ctx, token)
    }

    /// Derive a cancellable context that is done after `timeout`. A timeout
    /// too large to represent as an `Instant` adds no deadline.
    pub fn with_timeout(&self, timeout: Duration) -> (Context, CancellationToken) {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.with_cancel(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this context is done, or `None` while it is still live
    pub fn err(&self) -> Option<ContextError> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Derive a context carrying `logger`
    #[must_use]
    pub fn with_logger(&self, logger: Arc<Logger>) -> Context {
        Context {
            logger: Some(logger),
            ..self.clone()
        }
    }

    /// Derive a context whose bound fields are this context's fields merged
    /// with `fields`. See [`ContextFields::merge`] for collision rules.
    #[must_use]
    pub fn with_fields<I>(&self, fields: I) -> Context
    where
        I: IntoIterator<Item = Field>,
    {
        let merged = match &self.fields {
            Some(existing) => existing.merge(fields),
            None => ContextFields::default().merge(fields),
        };
        Context {
            fields: Some(merged),
            ..self.clone()
        }
    }

    pub fn logger(&self) -> Option<&Arc<Logger>> {
        self.logger.as_ref()
    }

    pub fn fields(&self) -> Option<&ContextFields> {
        self.fields.as_ref()
    }

    /// Derive a context carrying `from`'s logger and fields, where present.
    /// Cancellation and deadline stay this context's own.
    #[must_use]
    pub fn with_logging_state_of(&self, from: &Context) -> Context {
        let mut ctx = self.clone();
        if let Some(logger) = &from.logger {
            ctx.logger = Some(Arc::clone(logger));
        }
        if let Some(fields) = &from.fields {
            ctx.fields = Some(fields.clone());
        }
        ctx
    }

    /// A logger that adds this context's bound fields to every record.
    pub fn context_logger(&self) -> Result<ContextLogger> {
        let logger = self.logger.as_ref().ok_or(LoggerError::LoggerNotFound)?;
        Ok(ContextLogger::new(Arc::clone(logger), self.fields.clone()))
    }

    /// Like [`Context::context_logger`], panicking if no logger is attached.
    #[track_caller]
    pub fn must_context_logger(&self) -> ContextLogger {
        match self.context_logger() {
            Ok(logger) => logger,
            Err(e) => panic!("{}", e),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("has_logger", &self.logger.is_some())
            .field("fields", &self.fields)
            .field("err", &self.err())
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// Attach `logger` to a context derived from `ctx`
pub fn attach_logger(ctx: &Context, logger: Arc<Logger>) -> Context {
    ctx.with_logger(logger)
}

/// Bind `fields` to a context derived from `ctx`
pub fn with_fields<I>(ctx: &Context, fields: I) -> Context
where
    I: IntoIterator<Item = Field>,
{
    ctx.with_fields(fields)
}

/// Copy logger and fields (only) from `from` onto a context derived from `to`
pub fn propagate_logging_state(to: &Context, from: &Context) -> Context {
    to.with_logging_state_of(from)
}

pub fn context_logger(ctx: &Context) -> Result<ContextLogger> {
    ctx.context_logger()
}

#[track_caller]
pub fn context_logger_must(ctx: &Context) -> ContextLogger {
    ctx.must_context_logger()
}
