//! Error types for the codec facade.

use cesr_core::{CoreError, ValidationError};
use cesr_parser::ParseError;
use thiserror::Error;

/// Errors that can occur during codec operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CesrError {
    /// Primitive or body codec error.
    #[error("codec error: {0}")]
    Core(#[from] CoreError),

    /// Stream parse error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Digest or signature check failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CesrError {
    /// Whether more input could let the operation succeed.
    pub fn is_incomplete(&self) -> bool {
        match self {
            CesrError::Core(e) => e.is_incomplete(),
            CesrError::Parse(e) => e.is_incomplete(),
            _ => false,
        }
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CesrError>;
