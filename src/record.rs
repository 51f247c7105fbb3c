use chrono::{DateTime, Utc};

use crate::attribute::Attribute;
use crate::options::Level;

/// Call-site location attached to a record.
///
/// Captured with the [`source_token!`](crate::source_token) macro; the token
/// is opaque to the caller and resolved into the `{"function", "file",
/// "line"}` source object at emit time. `function` carries the caller's
/// module path.
#[derive(Clone, Copy, Debug)]
pub struct SourceToken {
    pub function: &'static str,
    pub file: &'static str,
    pub line: u32,
}

/// Captures a [`SourceToken`] for the current source location.
#[macro_export]
macro_rules! source_token {
    () => {
        $crate::record::SourceToken {
            function: module_path!(),
            file: file!(),
            line: line!(),
        }
    };
}

/// One log record: timestamp, level, message, optional source token, and
/// the ordered attributes supplied at the call site.
///
/// # Examples
///
/// ```
/// use json_logger::{Attribute, Level, Record};
///
/// let mut record = Record::new(Level::Info, "started");
/// record.add_attribute(Attribute::int("port", 8080));
/// assert_eq!(record.attributes.len(), 1);
/// assert!(record.time.is_some());
/// ```
#[derive(Clone, Debug)]
pub struct Record {
    /// Record timestamp; `None` suppresses the time field entirely.
    pub time: Option<DateTime<Utc>>,
    pub level: Level,
    pub message: String,
    pub source: Option<SourceToken>,
    pub attributes: Vec<Attribute>,
}

impl Record {
    /// Creates a record stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Some(Utc::now()),
            level,
            message: message.into(),
            source: None,
            attributes: Vec::new(),
        }
    }

    /// Replaces the timestamp. `None` suppresses the time field.
    pub fn with_time(mut self, time: Option<DateTime<Utc>>) -> Self {
        self.time = time;
        self
    }

    pub fn set_source(&mut self, token: SourceToken) {
        self.source = Some(token);
    }

    pub fn add_attribute(&mut self, attr: Attribute) {
        self.attributes.push(attr);
    }

    pub fn add_attributes(&mut self, attrs: impl IntoIterator<Item = Attribute>) {
        self.attributes.extend(attrs);
    }
}
