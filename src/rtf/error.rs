//! Error types for RTF de-encapsulation.
//!
//! Malformed RTF syntax is never an error: the parser absorbs it. Only a
//! failing byte source (or a corrupt compressed container) aborts extraction.

use thiserror::Error;

/// Result type for RTF operations.
pub type RtfResult<T> = Result<T, RtfError>;

/// RTF extraction errors.
#[derive(Error, Debug)]
pub enum RtfError {
    /// The underlying byte source failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Compressed RTF container is corrupt
    #[error("Invalid compressed RTF: {0}")]
    InvalidCompressed(String),

    /// A previous extraction failed part-way and the source cannot be replayed
    #[error("RTF source was consumed by a failed extraction")]
    SourceConsumed,
}
