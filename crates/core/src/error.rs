//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic parsing failures. Store and
/// transport failures belong to `saga-infra`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A filter operator was not recognised.
    #[error("unknown filter operator: {0}")]
    UnknownOperator(String),

    /// A collection name was empty or contained characters not allowed in a path segment.
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),
}

