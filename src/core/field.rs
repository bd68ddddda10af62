//! Typed key/value fields attached to log records
//!
//! A [`Field`] is immutable once built. Each constructor picks the
//! [`FieldValue`] variant for its type, so sinks can render every kind
//! exhaustively. [`Field::any`] is the one escape hatch: it goes through
//! `serde` and accepts anything serializable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

/// Value carried by a [`Field`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    /// Opaque bytes, base64-free hex rendering in text sinks
    Binary(Vec<u8>),
    /// UTF-8 text held as bytes
    ByteString(Vec<u8>),
    Duration(Duration),
    Time(DateTime<Utc>),
    /// Rendered error message
    Error(String),
    /// Arbitrary serde-reflected value
    Reflect(serde_json::Value),
    /// Explicit absence, produced by the `*_opt` constructors
    Null,
    /// No-op; dropped by every sink
    Skip,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Uint(u) => write!(f, "{}", u),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::String(s) | FieldValue::Error(s) => write!(f, "{}", s),
            FieldValue::Binary(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            FieldValue::ByteString(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            FieldValue::Duration(d) => write!(f, "{:?}", d),
            FieldValue::Time(t) => write!(f, "{}", t.to_rfc3339()),
            FieldValue::Reflect(v) => write!(f, "{}", v),
            FieldValue::Null => write!(f, "null"),
            FieldValue::Skip => Ok(()),
        }
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::Number((*i).into()),
            FieldValue::Uint(u) => Value::Number((*u).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                // NaN and infinities have no JSON number form
                .unwrap_or_else(|| Value::String(f.to_string())),
            FieldValue::String(s) | FieldValue::Error(s) => Value::String(s.clone()),
            FieldValue::Binary(_) => Value::String(self.to_string()),
            FieldValue::ByteString(bytes) => {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
            FieldValue::Duration(d) => serde_json::Number::from_f64(d.as_secs_f64())
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Time(t) => {
                Value::String(t.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true))
            }
            FieldValue::Reflect(v) => v.clone(),
            FieldValue::Null | FieldValue::Skip => Value::Null,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for FieldValue {
            fn from(i: $ty) -> Self {
                FieldValue::Int(i as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for FieldValue {
            fn from(u: $ty) -> Self {
                FieldValue::Uint(u as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<f32> for FieldValue {
    fn from(f: f32) -> Self {
        FieldValue::Float(f64::from(f))
    }
}

impl From<Duration> for FieldValue {
    fn from(d: Duration) -> Self {
        FieldValue::Duration(d)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Time(t)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// A typed key/value pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    key: Cow<'static, str>,
    value: FieldValue,
}

impl Field {
    /// Build a field from anything convertible into a [`FieldValue`]
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Whether sinks should drop this field
    pub fn is_skip(&self) -> bool {
        matches!(self.value, FieldValue::Skip)
    }

    /// A no-op field, useful when a constructor gets invalid input
    pub fn skip() -> Self {
        Self {
            key: Cow::Borrowed(""),
            value: FieldValue::Skip,
        }
    }

    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(key, value)
    }

    pub fn bool_opt(key: impl Into<Cow<'static, str>>, value: Option<bool>) -> Self {
        Self::new(key, value)
    }

    pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::new(key, value)
    }

    pub fn int_opt(key: impl Into<Cow<'static, str>>, value: Option<i64>) -> Self {
        Self::new(key, value)
    }

    pub fn uint(key: impl Into<Cow<'static, str>>, value: u64) -> Self {
        Self::new(key, value)
    }

    pub fn uint_opt(key: impl Into<Cow<'static, str>>, value: Option<u64>) -> Self {
        Self::new(key, value)
    }

    pub fn float(key: impl Into<Cow<'static, str>>, value: f64) -> Self {
        Self::new(key, value)
    }

    pub fn float_opt(key: impl Into<Cow<'static, str>>, value: Option<f64>) -> Self {
        Self::new(key, value)
    }

    pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::String(value.into()))
    }

    pub fn string_opt(key: impl Into<Cow<'static, str>>, value: Option<String>) -> Self {
        Self::new(key, value)
    }

    /// Opaque binary blob
    pub fn binary(key: impl Into<Cow<'static, str>>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(key, FieldValue::Binary(value.into()))
    }

    /// UTF-8 text held as bytes; use [`Field::binary`] for arbitrary data
    pub fn byte_string(key: impl Into<Cow<'static, str>>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(key, FieldValue::ByteString(value.into()))
    }

    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, value)
    }

    pub fn duration_opt(key: impl Into<Cow<'static, str>>, value: Option<Duration>) -> Self {
        Self::new(key, value)
    }

    pub fn time(key: impl Into<Cow<'static, str>>, value: DateTime<Utc>) -> Self {
        Self::new(key, value)
    }

    pub fn time_opt(key: impl Into<Cow<'static, str>>, value: Option<DateTime<Utc>>) -> Self {
        Self::new(key, value)
    }

    /// Renders `value` with its `Display` impl
    pub fn stringer(key: impl Into<Cow<'static, str>>, value: &impl fmt::Display) -> Self {
        Self::new(key, FieldValue::String(value.to_string()))
    }

    /// Any serializable value. If serialization fails the error text is
    /// stored instead, so the failure is visible in the output.
    pub fn any<T: Serialize + ?Sized>(key: impl Into<Cow<'static, str>>, value: &T) -> Self {
        let value = match serde_json::to_value(value) {
            Ok(v) => FieldValue::Reflect(v),
            Err(e) => FieldValue::Error(format!("json: unsupported value: {}", e)),
        };
        Self::new(key, value)
    }

    /// Backtrace of the current thread, captured eagerly
    pub fn stack(key: impl Into<Cow<'static, str>>) -> Self {
        Self::stack_skip(key, 0)
    }

    /// Like [`Field::stack`], with the top `skip` frames removed
    pub fn stack_skip(key: impl Into<Cow<'static, str>>, skip: usize) -> Self {
        let trace = std::backtrace::Backtrace::force_capture().to_string();
        Self::new(key, FieldValue::String(skip_frames(&trace, skip)))
    }

    /// Shorthand for an `"error"` field.
    ///
    /// Unlike [`Field::named_error`], `None` still yields the field with an
    /// empty value, so the `"error"` key is always present.
    pub fn error(err: Option<&dyn std::error::Error>) -> Self {
        let message = err.map(|e| e.to_string()).unwrap_or_default();
        Self::new("error", FieldValue::String(message))
    }

    /// Error under a custom key. `None` yields a skip field.
    pub fn named_error(
        key: impl Into<Cow<'static, str>>,
        err: Option<&dyn std::error::Error>,
    ) -> Self {
        match err {
            Some(e) => Self::new(key, FieldValue::Error(e.to_string())),
            None => Self::skip(),
        }
    }
}

/// Drop the first `skip` frames of a rendered backtrace. A frame starts
/// with a `<index>:` line; `at <file>` lines belong to the frame above.
fn skip_frames(trace: &str, skip: usize) -> String {
    if skip == 0 {
        return trace.to_string();
    }
    let mut frames_seen = 0usize;
    let mut kept = String::with_capacity(trace.len());
    for line in trace.lines() {
        let is_frame_start = line.trim_start().split_once(':').is_some_and(|(index, _)| {
            !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())
        });
        if is_frame_start {
            frames_seen += 1;
        }
        if frames_seen > skip {
            kept.push_str(line);
            kept.push('\n');
        }
    }
    kept
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
