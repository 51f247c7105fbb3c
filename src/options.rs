use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::attribute::Attribute;

/// Severity of a log record, ordered from least to most severe.
///
/// An [`Emitter`](crate::Emitter) only emits records whose level is at or
/// above its configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Level; 4] = [Level::Debug, Level::Info, Level::Warn, Level::Error];

    /// Default display string for the level, as written to the level field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replace-attribute hook.
///
/// Called with the group-name path of the attribute's location and the
/// attribute itself (lazy values already resolved). May return the attribute
/// unchanged, a transformed attribute, or the tombstone to elide it.
/// When a hook is configured it sees every field, basic record fields
/// included.
pub type ReplaceFn = Arc<dyn Fn(&[String], Attribute) -> Attribute + Send + Sync>;

/// Construction-time configuration for an [`Emitter`](crate::Emitter).
///
/// Missing configuration is defaulted silently, never rejected.
#[derive(Clone)]
pub struct Options {
    /// Minimum level a record must reach to be emitted.
    pub level: Level,
    /// Write the record's source location as a nested object.
    pub add_source: bool,
    /// Optional hook applied to every attribute before serialization.
    pub replace_attribute: Option<ReplaceFn>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            level: Level::Info,
            add_source: false,
            replace_attribute: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("level", &self.level)
            .field("add_source", &self.add_source)
            .field(
                "replace_attribute",
                &self.replace_attribute.as_ref().map(|_| "<hook>"),
            )
            .finish()
    }
}

/// Extension block overriding output details of an emitter.
///
/// Every field has a working default; leave fields empty/`None` to accept
/// them. [`Extras::fixed`] fills the gaps at construction time.
#[derive(Clone, Debug, Default)]
pub struct Extras {
    /// Key for the record timestamp. Defaults to `"time"`.
    pub time_key: String,
    /// Key for the record level. Defaults to `"level"`.
    pub level_key: String,
    /// Key for the record message. Defaults to `"msg"`.
    pub message_key: String,
    /// Key for the source-location object. Defaults to `"source"`.
    pub source_key: String,
    /// Per-level display strings. Levels absent from the map use
    /// [`Level::as_str`].
    pub level_names: HashMap<Level, String>,
    /// chrono format string for the time field.
    /// `None` means RFC3339 with nanoseconds.
    pub time_format: Option<String>,
    /// Escape embedded non-ASCII characters as `\uXXXX` in all quoted
    /// strings instead of passing UTF-8 through.
    pub escape_utf8: bool,
}

impl Extras {
    /// Returns a copy with every unset field replaced by its default.
    pub fn fixed(mut self) -> Extras {
        if self.time_key.is_empty() {
            self.time_key = "time".to_string();
        }
        if self.level_key.is_empty() {
            self.level_key = "level".to_string();
        }
        if self.message_key.is_empty() {
            self.message_key = "msg".to_string();
        }
        if self.source_key.is_empty() {
            self.source_key = "source".to_string();
        }
        for level in Level::ALL {
            self.level_names
                .entry(level)
                .or_insert_with(|| level.as_str().to_string());
        }
        self
    }

    /// Display string for a level, honoring any configured override.
    pub fn level_name(&self, level: Level) -> &str {
        self.level_names
            .get(&level)
            .map(String::as_str)
            .unwrap_or_else(|| level.as_str())
    }

    /// Formats a timestamp according to the configured time format.
    pub fn format_time(&self, time: &DateTime<Utc>) -> String {
        match &self.time_format {
            Some(format) => time.format(format).to_string(),
            None => time.to_rfc3339_opts(SecondsFormat::Nanos, true),
        }
    }
}
