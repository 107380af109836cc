//! Errors raised by cart and catalog primitives.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failures the operator can act on: bad input, a line already in the cart,
/// a line that is gone. Transport failures live in the client crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Unrecognised operator input, e.g. an unknown action name.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Blank item code.
    #[error("invalid item id: {0}")]
    InvalidId(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    /// No cart line with the given id.
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
