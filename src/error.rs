use std::io;

use thiserror::Error;

/// Errors surfaced by composition and emission.
///
/// A `Marshal` error is recoverable at the stream level: the composer has
/// already written a quoted `"!ERROR:<message>"` placeholder in place of the
/// offending value, so any buffer it was building remains valid JSON. The
/// error is still reported so callers know the record was degraded.
///
/// A `Write` error means the sink rejected or only partially completed the
/// write. It is returned verbatim and never retried; the record is considered
/// lost at this layer.
#[derive(Debug, Error)]
pub enum EmitError {
    /// An `Any` value could not be converted to JSON output.
    #[error("marshal attribute value: {message}")]
    Marshal { message: String },

    /// The sink failed while writing a complete log line.
    #[error("write log line: {0}")]
    Write(#[from] io::Error),
}
