use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::attribute::{is_empty_group, AnyValue, Attribute, Value};
use crate::error::EmitError;
use crate::options::{Extras, ReplaceFn};

/// Serializes one flat level of attributes to JSON bytes.
///
/// A composer is transient: one is created per derivation or emit call,
/// accumulates output in its buffer, and is discarded afterward. It applies
/// escaping, type dispatch, and the replace-attribute hook, recursing into
/// nested groups. It never touches the sink; its bytes are either retained
/// as a derivation prefix or assembled into a full record body.
///
/// Comma placement is driven by the `started` flag: the first field written
/// at the current nesting level sets the flag, every later field is preceded
/// by `, `.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use json_logger::{Attribute, Extras};
/// use json_logger::composer::Composer;
///
/// let extras = Arc::new(Extras::default().fixed());
/// let mut composer = Composer::new(Vec::new(), false, None, Vec::new(), extras);
/// composer.add_attribute(Attribute::bool("flag", true)).unwrap();
/// composer.add_attribute(Attribute::int("count", 3)).unwrap();
/// assert_eq!(composer.into_bytes(), br#""flag": true, "count": 3"#);
/// ```
pub struct Composer {
    buffer: Vec<u8>,
    started: bool,
    replace: Option<ReplaceFn>,
    groups: Vec<String>,
    extras: Arc<Extras>,
}

impl Composer {
    /// Creates a composer over `buffer`, which may already hold output.
    ///
    /// `started` seeds the comma protocol: pass `true` when the buffer
    /// already ends with a field at the current nesting level.
    pub fn new(
        buffer: Vec<u8>,
        started: bool,
        replace: Option<ReplaceFn>,
        groups: Vec<String>,
        extras: Arc<Extras>,
    ) -> Self {
        Self {
            buffer,
            started,
            replace,
            groups,
            extras,
        }
    }

    /// Clears the started flag, suppressing the next comma.
    ///
    /// Used after appending a prefix that ends in an open brace: the next
    /// field is the first one inside that group.
    pub fn reset(&mut self) {
        self.started = false;
    }

    /// Number of bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the composer, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Appends raw bytes without separator or escaping.
    pub fn append(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes `, ` unless this is the first field at the current level.
    pub fn add_separator(&mut self) {
        if self.started {
            self.buffer.extend_from_slice(b", ");
        } else {
            self.started = true;
        }
    }

    /// Writes an escaped, quoted key followed by `: `.
    pub fn add_key(&mut self, key: &str) {
        self.add_quoted(key);
        self.buffer.extend_from_slice(b": ");
    }

    /// Writes a quoted timestamp in the configured format.
    pub fn add_time(&mut self, time: &DateTime<Utc>) {
        let text = self.extras.format_time(time);
        self.add_quoted(&text);
    }

    /// Consumes one attribute: resolves lazy values, applies the replace
    /// hook, drops tombstones and empty groups, inlines empty-key groups,
    /// and otherwise writes `"key": <value>` with comma handling.
    pub fn add_attribute(&mut self, attr: Attribute) -> Result<(), EmitError> {
        let mut attr = attr.resolve();
        if let Some(replace) = &self.replace {
            let replace = Arc::clone(replace);
            attr = replace(&self.groups, attr).resolve();
        }
        if attr.is_tombstone() {
            return Ok(());
        }
        if matches!(attr.value, Value::Empty) {
            // A keyed attribute with the empty value has nothing to render.
            return Ok(());
        }
        if let Value::Group(members) = &attr.value {
            if is_empty_group(members) {
                return Ok(());
            }
        }
        if attr.key.is_empty() {
            if let Value::Group(members) = attr.value {
                // Inline: members join the current nesting level.
                return self.add_attributes(members);
            }
        }
        let Attribute { key, value } = attr;
        self.add_separator();
        self.add_key(&key);
        match value {
            Value::Group(members) => self.add_group(&key, members),
            Value::Bool(b) => {
                self.buffer
                    .extend_from_slice(if b { b"true" } else { b"false" });
                Ok(())
            }
            Value::Int64(i) => {
                self.buffer.extend_from_slice(i.to_string().as_bytes());
                Ok(())
            }
            Value::Uint64(u) => {
                self.buffer.extend_from_slice(u.to_string().as_bytes());
                Ok(())
            }
            Value::Float64(f) => {
                self.buffer.extend_from_slice(f.to_string().as_bytes());
                Ok(())
            }
            Value::Duration(d) => {
                self.buffer
                    .extend_from_slice(d.as_nanos().to_string().as_bytes());
                Ok(())
            }
            Value::String(s) => {
                self.add_quoted(&s);
                Ok(())
            }
            Value::Time(t) => {
                self.add_time(&t);
                Ok(())
            }
            Value::Any(any) => self.add_any(any),
            // resolve() above removed these kinds.
            Value::Empty | Value::Lazy(_) => Ok(()),
        }
    }

    /// Consumes a list of attributes in order.
    pub fn add_attributes(
        &mut self,
        attrs: impl IntoIterator<Item = Attribute>,
    ) -> Result<(), EmitError> {
        for attr in attrs {
            self.add_attribute(attr)?;
        }
        Ok(())
    }

    /// Writes a nested object for a non-empty named group.
    fn add_group(&mut self, key: &str, members: Vec<Attribute>) -> Result<(), EmitError> {
        self.buffer.push(b'{');
        let saved = self.started;
        self.started = false;
        let tracking = self.replace.is_some();
        if tracking {
            self.groups.push(key.to_string());
        }
        let result = self.add_attributes(members);
        if tracking {
            self.groups.pop();
        }
        self.started = saved;
        result?;
        self.buffer.push(b'}');
        Ok(())
    }

    /// Dispatches an opaque value to its capability, chosen at construction.
    pub fn add_any(&mut self, any: AnyValue) -> Result<(), EmitError> {
        match any {
            AnyValue::Json(marshal) => match marshal.marshal_json() {
                Ok(bytes) => {
                    self.buffer.extend_from_slice(&bytes);
                    Ok(())
                }
                Err(err) => Err(self.fail_marshal(err)),
            },
            AnyValue::Text(marshal) => match marshal.marshal_text() {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    self.add_quoted(&text);
                    Ok(())
                }
                Err(err) => Err(self.fail_marshal(err)),
            },
            AnyValue::Display(value) => {
                self.add_quoted(&value.to_string());
                Ok(())
            }
            AnyValue::Error(err) => {
                self.add_quoted(&err.to_string());
                Ok(())
            }
            AnyValue::Serialized(serialize) => match serialize() {
                Ok(bytes) => {
                    self.buffer.extend_from_slice(&bytes);
                    Ok(())
                }
                Err(err) => Err(self.fail_marshal(err)),
            },
        }
    }

    /// Writes the diagnostic placeholder for a failed marshal and builds the
    /// error reported to the caller. The placeholder keeps the stream valid.
    fn fail_marshal(&mut self, err: impl fmt::Display) -> EmitError {
        let message = err.to_string();
        self.add_quoted(&format!("!ERROR:{message}"));
        EmitError::Marshal { message }
    }

    /// Writes a quoted, escaped string.
    pub fn add_quoted(&mut self, text: &str) {
        self.buffer.push(b'"');
        self.add_escaped(text);
        self.buffer.push(b'"');
    }

    /// Escapes string content: `\b \f \n \r \t` for those control
    /// characters, `\u00XX` for other bytes below 0x20, backslash escapes
    /// for `"`, `\` and `/`. Multi-byte UTF-8 passes through unchanged
    /// unless `escape_utf8` is configured, in which case every non-ASCII
    /// character becomes `\uXXXX` UTF-16 units.
    fn add_escaped(&mut self, text: &str) {
        if self.extras.escape_utf8 {
            for ch in text.chars() {
                if ch.is_ascii() {
                    self.escape_ascii(ch as u8);
                } else {
                    let mut units = [0u16; 2];
                    for &unit in ch.encode_utf16(&mut units).iter() {
                        self.buffer
                            .extend_from_slice(format!("\\u{unit:04x}").as_bytes());
                    }
                }
            }
        } else {
            for &byte in text.as_bytes() {
                if byte.is_ascii() {
                    self.escape_ascii(byte);
                } else {
                    self.buffer.push(byte);
                }
            }
        }
    }

    fn escape_ascii(&mut self, byte: u8) {
        match byte {
            b'"' => self.buffer.extend_from_slice(b"\\\""),
            b'\\' => self.buffer.extend_from_slice(b"\\\\"),
            b'/' => self.buffer.extend_from_slice(b"\\/"),
            0x08 => self.buffer.extend_from_slice(b"\\b"),
            0x0c => self.buffer.extend_from_slice(b"\\f"),
            b'\n' => self.buffer.extend_from_slice(b"\\n"),
            b'\r' => self.buffer.extend_from_slice(b"\\r"),
            b'\t' => self.buffer.extend_from_slice(b"\\t"),
            byte if byte < 0x20 => {
                self.buffer
                    .extend_from_slice(format!("\\u{byte:04x}").as_bytes());
            }
            byte => self.buffer.push(byte),
        }
    }
}
