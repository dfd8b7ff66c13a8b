//! Errors raised when constructing shared primitives.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Rejected input for a core type (SKU, identifier).
///
/// Store, transport and prediction failures have their own error types in
/// the crates that own those concerns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// Identifier text that is not a UUID.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
