//! Error types for the stream parser.

use cesr_core::{Cold, CoreError};
use thiserror::Error;

/// Errors that can occur while parsing a stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Codec or container error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A message body was expected but the stream holds another element.
    #[error("expected a message body at offset {offset}, found {found} code")]
    UnexpectedCold { found: Cold, offset: usize },

    /// A body was not followed by any attachment group.
    #[error("message at offset {offset} has no attachments")]
    MissingAttachments { offset: usize },

    /// A nested group carried a code its parent does not allow.
    #[error("nested group in {parent} must be {expected}, got {got}")]
    NestingMismatch {
        parent: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    /// Groups nested deeper than configured.
    #[error("attachment nesting exceeds depth {0}")]
    TooDeep(usize),

    /// Incremental buffer grew past its limit.
    #[error("buffered {size} bytes exceeds limit {limit}")]
    BufferFull { size: usize, limit: usize },
}

impl ParseError {
    /// Whether more input could let the parse succeed.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::Core(e) if e.is_incomplete())
    }
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;
