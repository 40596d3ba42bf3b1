//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid input or data.
/// These are independent of transport and storage concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid complexity '{value}': {reason}")]
    InvalidComplexity { value: String, reason: String },

    #[error("malformed BOM data: {message}")]
    MalformedTree { message: String },

    #[error("empty hierarchy")]
    EmptyHierarchy,
}
