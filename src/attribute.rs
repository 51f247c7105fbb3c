use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Error type produced by the custom marshal traits.
pub type MarshalError = Box<dyn Error + Send + Sync>;

/// Values carrying their own JSON representation.
///
/// The marshaled bytes are written to the output verbatim, so they must form
/// a single valid JSON value.
pub trait JsonMarshal: Send + Sync {
    fn marshal_json(&self) -> Result<Vec<u8>, MarshalError>;
}

/// Values carrying their own textual representation.
///
/// The marshaled bytes are written as a quoted, escaped JSON string.
pub trait TextMarshal: Send + Sync {
    fn marshal_text(&self) -> Result<Vec<u8>, MarshalError>;
}

/// Zero-argument resolver producing the value of a lazy attribute.
pub type LazyResolver = Arc<dyn Fn() -> Value + Send + Sync>;

/// Capability wrapper for opaque values.
///
/// The capability is chosen at attribute construction time, in priority
/// order: custom JSON marshal, custom text marshal, `Display`, `Error`, and
/// finally the reflective serde fallback.
#[derive(Clone)]
pub enum AnyValue {
    /// Written verbatim as raw JSON.
    Json(Arc<dyn JsonMarshal>),
    /// Written as a quoted, escaped string.
    Text(Arc<dyn TextMarshal>),
    /// `Display` output, quoted and escaped.
    Display(Arc<dyn fmt::Display + Send + Sync>),
    /// `Error` display output, quoted and escaped.
    Error(Arc<dyn Error + Send + Sync>),
    /// Deferred `serde_json` serialization, written verbatim.
    Serialized(Arc<dyn Fn() -> Result<Vec<u8>, serde_json::Error> + Send + Sync>),
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyValue::Json(_) => f.write_str("AnyValue::Json(..)"),
            AnyValue::Text(_) => f.write_str("AnyValue::Text(..)"),
            AnyValue::Display(value) => write!(f, "AnyValue::Display({value})"),
            AnyValue::Error(err) => write!(f, "AnyValue::Error({err})"),
            AnyValue::Serialized(_) => f.write_str("AnyValue::Serialized(..)"),
        }
    }
}

/// Tagged union of every value kind an attribute can carry.
#[derive(Clone)]
pub enum Value {
    /// The tombstone value: renders nothing.
    Empty,
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    String(String),
    /// Emitted as integer nanoseconds.
    Duration(Duration),
    Time(DateTime<Utc>),
    /// Ordered member attributes of a nested object.
    Group(Vec<Attribute>),
    Any(AnyValue),
    /// Deferred value, resolved when logging actually happens.
    Lazy(LazyResolver),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => f.write_str("Empty"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Int64(v) => write!(f, "Int64({v})"),
            Value::Uint64(v) => write!(f, "Uint64({v})"),
            Value::Float64(v) => write!(f, "Float64({v})"),
            Value::String(v) => write!(f, "String({v:?})"),
            Value::Duration(v) => write!(f, "Duration({v:?})"),
            Value::Time(v) => write!(f, "Time({v})"),
            Value::Group(members) => f.debug_tuple("Group").field(members).finish(),
            Value::Any(any) => write!(f, "Any({any:?})"),
            Value::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Upper bound on chained lazy resolution before giving up.
const MAX_LAZY_DEPTH: usize = 100;

/// A key/value pair attached to a record or group.
///
/// The zero value (empty key, [`Value::Empty`]) is the tombstone, used to
/// mark deliberate elision: the composer drops tombstones without output.
///
/// # Examples
///
/// ```
/// use json_logger::Attribute;
///
/// let attr = Attribute::int("year", 1957);
/// assert_eq!(attr.key, "year");
/// assert!(!attr.is_tombstone());
/// assert!(Attribute::tombstone().is_tombstone());
/// ```
#[derive(Clone, Debug)]
pub struct Attribute {
    pub key: String,
    pub value: Value,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// The sentinel attribute marking deliberate elision.
    pub fn tombstone() -> Self {
        Self {
            key: String::new(),
            value: Value::Empty,
        }
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, Value::Int64(value))
    }

    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, Value::Uint64(value))
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, Value::Float64(value))
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, Value::Duration(value))
    }

    pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::new(key, Value::Time(value))
    }

    /// A nested object with ordered members. An empty key inlines the
    /// members at the enclosing level instead of opening a nested object.
    pub fn group(key: impl Into<String>, members: Vec<Attribute>) -> Self {
        Self::new(key, Value::Group(members))
    }

    /// Defers computing the value until the record is actually logged.
    pub fn lazy(
        key: impl Into<String>,
        resolver: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::new(key, Value::Lazy(Arc::new(resolver)))
    }

    /// An opaque value with a custom JSON representation.
    pub fn json_marshal(key: impl Into<String>, value: impl JsonMarshal + 'static) -> Self {
        Self::new(key, Value::Any(AnyValue::Json(Arc::new(value))))
    }

    /// An opaque value with a custom textual representation.
    pub fn text_marshal(key: impl Into<String>, value: impl TextMarshal + 'static) -> Self {
        Self::new(key, Value::Any(AnyValue::Text(Arc::new(value))))
    }

    /// An opaque value rendered through its `Display` implementation.
    pub fn display(
        key: impl Into<String>,
        value: impl fmt::Display + Send + Sync + 'static,
    ) -> Self {
        Self::new(key, Value::Any(AnyValue::Display(Arc::new(value))))
    }

    /// An error value rendered through its `Display` implementation.
    pub fn error(key: impl Into<String>, err: impl Error + Send + Sync + 'static) -> Self {
        Self::new(key, Value::Any(AnyValue::Error(Arc::new(err))))
    }

    /// An opaque value serialized reflectively through serde at emit time.
    pub fn serialize<T>(key: impl Into<String>, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self::new(
            key,
            Value::Any(AnyValue::Serialized(Arc::new(move || {
                serde_json::to_vec(&value)
            }))),
        )
    }

    /// True if this attribute is the tombstone sentinel.
    pub fn is_tombstone(&self) -> bool {
        self.key.is_empty() && matches!(self.value, Value::Empty)
    }

    /// Resolves chained lazy values, leaving every other kind untouched.
    ///
    /// Resolution is bounded: a chain deeper than the internal limit degrades
    /// to a diagnostic string so logging cannot loop forever.
    pub fn resolve(mut self) -> Attribute {
        let mut depth = 0;
        while let Value::Lazy(resolver) = &self.value {
            if depth >= MAX_LAZY_DEPTH {
                self.value = Value::String("!ERROR:lazy value chain too deep".to_string());
                break;
            }
            self.value = resolver();
            depth += 1;
        }
        self
    }
}

/// True if the attribute list contains nothing that would render: every
/// member is a tombstone or itself an empty group, at any depth.
pub fn is_empty_group(attrs: &[Attribute]) -> bool {
    for attr in attrs {
        if attr.is_tombstone() {
            continue;
        }
        match &attr.value {
            Value::Group(members) => {
                if !is_empty_group(members) {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}
