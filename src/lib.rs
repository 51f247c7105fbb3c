//! # JSON Logger
//!
//! A structured logging core that writes one self-contained JSON line per
//! record to a caller-supplied byte sink, built around three ideas:
//!
//! * **Incremental, immutable derivation**: attach fixed attributes or open
//!   nested groups ahead of time; the derived state is serialized once, at
//!   derivation time, and never again.
//! * **Group elision**: a derived group that turns out to contain nothing at
//!   the moment of logging never appears in the output, at any nesting depth.
//! * **A single guarded write**: each record is assembled off-lock and
//!   written to the sink as one atomic call.
//!
//! ## Main Components
//!
//! * `Emitter`: immutable derivation-tree node producing serialized log lines
//! * `Composer`: transient serializer turning attributes into JSON bytes
//! * `Attribute`/`Value`: the tagged-union attribute model, with lazy values
//!   and a tombstone sentinel for deliberate elision
//! * `Options`/`Extras`: level threshold, source capture, replace hook, and
//!   output overrides (field keys, level names, time format)
//!
//! ## Quick Start
//!
//! ```
//! use json_logger::{emit_record, Attribute, Emitter, Extras, Level, Options};
//!
//! let emitter = Emitter::new(std::io::stdout(), Options::default(), Extras::default());
//!
//! // Derive once, reuse everywhere: the fixed attributes are serialized
//! // here, not on every call.
//! let emitter = emitter.with_attributes(vec![Attribute::string("app", "quickstart")]);
//!
//! emit_record!(emitter, Level::Info, "listening",
//!     Attribute::string("addr", "127.0.0.1:8080"),
//! ).unwrap();
//!
//! // Groups nest the call-site attributes; empty groups vanish entirely.
//! let request = emitter.with_group("request");
//! emit_record!(request, Level::Info, "handled",
//!     Attribute::int("status", 200),
//! ).unwrap();
//! ```

pub mod attribute;
pub mod composer;
pub mod emitter;
pub mod error;
pub mod options;
pub mod pool;
pub mod record;

pub use attribute::{
    is_empty_group, AnyValue, Attribute, JsonMarshal, MarshalError, TextMarshal, Value,
};
pub use composer::Composer;
pub use emitter::Emitter;
pub use error::EmitError;
pub use options::{Extras, Level, Options, ReplaceFn};
pub use pool::ArrayPool;
pub use record::{Record, SourceToken};
