use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::attribute::{is_empty_group, Attribute, Value};
use crate::composer::Composer;
use crate::error::EmitError;
use crate::options::{Extras, Level, Options};
use crate::pool::LOG_BUFFER_POOL;
use crate::record::Record;

/// An immutable node of the derivation tree, producing one self-contained
/// JSON line per record on a shared sink.
///
/// Derivation is pure: [`with_attributes`](Emitter::with_attributes) and
/// [`with_group`](Emitter::with_group) return new nodes and never mutate
/// their parent, so the tree needs no locking. Each node carries a prefix
/// (its derived attributes, already serialized) and a suffix (closing braces
/// for groups opened by ancestors); emitting a record only serializes the
/// basic fields and the per-call attributes, never the ancestor state.
///
/// The sink is the only shared mutable resource: all nodes descending from
/// one root write through the same mutex, and each record is written as a
/// single call while the lock is held.
///
/// # Thread Safety
///
/// Emitters may be cloned and shared freely across threads. Concurrent
/// `emit` calls serialize on the sink lock only; each produces exactly one
/// complete line.
///
/// # Examples
///
/// ```
/// use json_logger::{Attribute, Emitter, Extras, Level, Options, Record};
///
/// let emitter = Emitter::new(std::io::sink(), Options::default(), Extras::default())
///     .with_attributes(vec![Attribute::string("app", "demo")])
///     .with_group("request");
///
/// let mut record = Record::new(Level::Info, "handled");
/// record.add_attribute(Attribute::int("status", 200));
/// emitter.emit(&record).unwrap();
/// ```
#[derive(Clone)]
pub struct Emitter {
    options: Arc<Options>,
    extras: Arc<Extras>,
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
    prefix: Vec<u8>,
    suffix: Vec<u8>,
    /// Group-name path for the replace hook; only tracked when a hook is
    /// configured.
    groups: Vec<String>,
    /// Present when this node was created by [`Emitter::with_group`] and no
    /// later derivation has committed content inside the group.
    group: Option<GroupLink>,
}

/// Ties a group emitter to the node it was derived from, for the elision
/// protocol: an empty group delegates the whole emit call to its parent.
#[derive(Clone)]
struct GroupLink {
    name: String,
    parent: Box<Emitter>,
}

impl Emitter {
    /// Creates the root emitter over a caller-supplied sink.
    ///
    /// Missing configuration is defaulted silently (see [`Extras::fixed`]).
    pub fn new(writer: impl Write + Send + 'static, options: Options, extras: Extras) -> Self {
        Self {
            options: Arc::new(options),
            extras: Arc::new(extras.fixed()),
            sink: Arc::new(Mutex::new(Box::new(writer))),
            prefix: Vec::new(),
            suffix: Vec::new(),
            groups: Vec::new(),
            group: None,
        }
    }

    /// True if records at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    /// Derives a new emitter with `attrs` serialized into its prefix.
    ///
    /// Pure: the parent is never mutated. Derivation cannot fail; if an
    /// `Any` value fails to marshal, its diagnostic placeholder becomes part
    /// of the prefix.
    pub fn with_attributes(&self, attrs: Vec<Attribute>) -> Emitter {
        let started = !self.prefix.is_empty() && !self.prefix.ends_with(b"{");
        let mut composer = Composer::new(
            self.prefix.clone(),
            started,
            self.options.replace_attribute.clone(),
            self.groups.clone(),
            Arc::clone(&self.extras),
        );
        // Marshal failures leave their placeholder in the prefix; there is
        // no caller to report them to at derivation time.
        let _ = composer.add_attributes(attrs);
        let prefix = composer.into_bytes();
        // If nothing was serialized (all tombstones), a pending group is
        // still empty and keeps its elision link.
        let group = if prefix.len() == self.prefix.len() {
            self.group.clone()
        } else {
            None
        };
        Emitter {
            options: Arc::clone(&self.options),
            extras: Arc::clone(&self.extras),
            sink: Arc::clone(&self.sink),
            prefix,
            suffix: self.suffix.clone(),
            groups: self.groups.clone(),
            group,
        }
    }

    /// Derives a new emitter scoped to a nested group named `name`.
    ///
    /// All attributes supplied at emit time land inside the group. The
    /// group's label and opening brace are committed to the prefix now, but
    /// if the group turns out empty at emit time it is elided entirely. An
    /// empty name is a no-op boundary: the emitter is returned unchanged.
    pub fn with_group(&self, name: &str) -> Emitter {
        if name.is_empty() {
            return self.clone();
        }
        let mut groups = self.groups.clone();
        if self.options.replace_attribute.is_some() {
            groups.push(name.to_string());
        }
        let mut prefix = self.prefix.clone();
        if !prefix.is_empty() && !prefix.ends_with(b"{") {
            prefix.extend_from_slice(b", ");
        }
        let mut composer = Composer::new(prefix, true, None, Vec::new(), Arc::clone(&self.extras));
        composer.add_key(name);
        let mut prefix = composer.into_bytes();
        prefix.push(b'{');

        let mut suffix = Vec::with_capacity(self.suffix.len() + 1);
        suffix.push(b'}');
        suffix.extend_from_slice(&self.suffix);

        Emitter {
            options: Arc::clone(&self.options),
            extras: Arc::clone(&self.extras),
            sink: Arc::clone(&self.sink),
            prefix,
            suffix,
            groups,
            group: Some(GroupLink {
                name: name.to_string(),
                parent: Box::new(self.clone()),
            }),
        }
    }

    /// Serializes and writes one record as a single newline-terminated JSON
    /// object.
    ///
    /// A marshal failure aborts before the sink is touched; a sink failure
    /// propagates verbatim. Neither is retried. The write completes before
    /// this call returns.
    pub fn emit(&self, record: &Record) -> Result<(), EmitError> {
        self.emit_internal(record, None)
    }

    /// The internal emit path. `collapsed` is the explicit side channel of
    /// the group-elision protocol: when a derived group finds itself empty
    /// at emit time it delegates here on its parent, naming itself, so the
    /// parent's emptiness check can discount the collapsing child. The value
    /// is per-call, so nested empty groups collapse correctly and concurrent
    /// emits never interfere.
    fn emit_internal(&self, record: &Record, collapsed: Option<&str>) -> Result<(), EmitError> {
        if let Some(link) = &self.group {
            if !self.record_fills_group(record, collapsed) {
                return link.parent.emit_internal(record, Some(&link.name));
            }
        }

        let buffer = LOG_BUFFER_POOL.acquire();
        let mut composer = Composer::new(
            buffer,
            false,
            self.options.replace_attribute.clone(),
            self.groups.clone(),
            Arc::clone(&self.extras),
        );
        let rendered = self.render(record, &mut composer);
        let buffer = composer.into_bytes();
        let outcome = match rendered {
            Ok(()) => {
                let mut sink = self.sink.lock();
                sink.write_all(&buffer).map_err(EmitError::from)
            }
            Err(err) => Err(err),
        };
        LOG_BUFFER_POOL.release(buffer);
        outcome
    }

    /// True if any record attribute survives resolution, the replace hook,
    /// and the tombstone/empty-group checks — i.e. the group this node opened
    /// would contain at least one member. A group-valued attribute whose key
    /// matches `collapsed` is a descendant group that already proved itself
    /// empty and does not count.
    fn record_fills_group(&self, record: &Record, collapsed: Option<&str>) -> bool {
        for attr in &record.attributes {
            let mut attr = attr.clone().resolve();
            if let Some(replace) = &self.options.replace_attribute {
                attr = replace(&self.groups, attr).resolve();
            }
            if attr.is_tombstone() || matches!(attr.value, Value::Empty) {
                continue;
            }
            if let Value::Group(members) = &attr.value {
                if is_empty_group(members) {
                    continue;
                }
                if collapsed == Some(attr.key.as_str()) {
                    continue;
                }
            }
            return true;
        }
        false
    }

    /// Assembles the full record body: basic fields, prefix, per-call
    /// attributes, suffix.
    fn render(&self, record: &Record, composer: &mut Composer) -> Result<(), EmitError> {
        let hooked = self.options.replace_attribute.is_some();
        composer.append(b"{");

        if let Some(time) = &record.time {
            if hooked {
                composer.add_attribute(Attribute::time(self.extras.time_key.clone(), *time))?;
            } else {
                composer.add_separator();
                composer.add_key(&self.extras.time_key);
                composer.add_time(time);
            }
        }
        if hooked {
            composer.add_attribute(Attribute::string(
                self.extras.level_key.clone(),
                self.extras.level_name(record.level),
            ))?;
            composer.add_attribute(Attribute::string(
                self.extras.message_key.clone(),
                record.message.clone(),
            ))?;
        } else {
            composer.add_separator();
            composer.add_key(&self.extras.level_key);
            composer.add_quoted(self.extras.level_name(record.level));
            composer.add_separator();
            composer.add_key(&self.extras.message_key);
            composer.add_quoted(&record.message);
        }
        if self.options.add_source {
            if let Some(source) = &record.source {
                composer.add_attribute(Attribute::group(
                    self.extras.source_key.clone(),
                    vec![
                        Attribute::string("function", source.function),
                        Attribute::string("file", source.file),
                        Attribute::int("line", i64::from(source.line)),
                    ],
                ))?;
            }
        }

        if !self.prefix.is_empty() {
            composer.add_separator();
            composer.append(&self.prefix);
            if self.prefix.ends_with(b"{") {
                // First record attribute is the first field inside the group.
                composer.reset();
            }
        }
        for attr in &record.attributes {
            composer.add_attribute(attr.clone())?;
        }
        composer.append(&self.suffix);
        composer.append(b"}\n");
        Ok(())
    }
}

/// Builds a [`Record`] stamped with the call site, attaches the given
/// attributes, and emits it — the usual way to log through an [`Emitter`].
///
/// Returns `Ok(())` without building the record when the emitter's level
/// threshold filters it out.
///
/// # Examples
///
/// ```
/// use json_logger::{emit_record, Attribute, Emitter, Extras, Level, Options};
///
/// let emitter = Emitter::new(std::io::sink(), Options::default(), Extras::default());
/// emit_record!(emitter, Level::Warn, "disk almost full",
///     Attribute::string("mount", "/var"),
///     Attribute::uint("free_mb", 412),
/// ).unwrap();
/// ```
#[macro_export]
macro_rules! emit_record {
    ($emitter:expr, $level:expr, $msg:expr $(, $attr:expr)* $(,)?) => {{
        let emitter = &$emitter;
        if emitter.enabled($level) {
            let mut record = $crate::record::Record::new($level, $msg);
            record.set_source($crate::source_token!());
            $( record.add_attribute($attr); )*
            emitter.emit(&record)
        } else {
            Ok(())
        }
    }};
}
