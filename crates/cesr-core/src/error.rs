//! Error types for CESR Core.

use thiserror::Error;

use crate::cold::Cold;
use crate::version::Protocol;

/// Which code table rejected a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeTable {
    Matter,
    Indexer,
    Counter,
}

impl std::fmt::Display for CodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeTable::Matter => write!(f, "primitive"),
            CodeTable::Indexer => write!(f, "indexed primitive"),
            CodeTable::Counter => write!(f, "count"),
        }
    }
}

/// Core errors raised by the codecs and the self-addressing container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("empty stream")]
    EmptyStream,

    #[error("unrecognized cold start tritet {tritet:#o}")]
    ColdStart { tritet: u8 },

    #[error("unexpected cold start: expected {expected}, found {found}")]
    UnexpectedCold { expected: Cold, found: Cold },

    #[error("insufficient bytes: need {needed}, have {available}")]
    InsufficientBytes { needed: usize, available: usize },

    #[error("unknown {table} code {code:?}")]
    UnknownCode { table: CodeTable, code: String },

    #[error("invalid base64 character {0:?}")]
    InvalidBase64(char),

    #[error("invalid primitive: {0}")]
    InvalidPrimitive(String),

    #[error("count {count} does not fit code {code}")]
    CountOverflow { code: String, count: u64 },

    #[error("no version string within the first {0} bytes")]
    MissingVersion(usize),

    #[error("malformed version string: {0}")]
    InvalidVersionString(String),

    #[error("unknown protocol {0:?}")]
    UnknownProtocol(String),

    #[error("unknown serialization kind {0:?}")]
    UnknownKind(String),

    #[error("unsupported version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("serialized size {size} exceeds maximum {max}")]
    SizeOverflow { size: usize, max: usize },

    #[error("expected {expected} body, got {got}")]
    UnexpectedProtocol { expected: Protocol, got: Protocol },

    #[error("missing field {0:?}")]
    MissingField(&'static str),

    #[error("malformed field {field:?}: {reason}")]
    MalformedField { field: &'static str, reason: String },

    #[error("unsupported digest code {0}")]
    UnsupportedDigest(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

impl CoreError {
    /// Whether more input could turn this error into a success.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, CoreError::InsufficientBytes { .. })
    }

    pub(crate) fn unknown(table: CodeTable, code: impl Into<String>) -> Self {
        CoreError::UnknownCode {
            table,
            code: code.into(),
        }
    }
}

/// Validation errors for digests and signatures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("said mismatch: expected {expected}, computed {computed}")]
    SaidMismatch { expected: String, computed: String },

    #[error("body carries no said")]
    MissingSaid,

    #[error("signature verification failed")]
    SignatureFailed,

    #[error("invalid verification key")]
    InvalidKey,

    #[error("unsupported code {0} for verification")]
    UnsupportedCode(String),

    #[error("signature index {index} has no key among {keys}")]
    IndexOutOfRange { index: u32, keys: usize },

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnsupportedDigest(code) => ValidationError::UnsupportedCode(code),
            other => ValidationError::StructuralError(other.to_string()),
        }
    }
}
