//! Common error types for the settlement ledger

use thiserror::Error;

/// Common error type used across ledger crates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid input was provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown role string
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

/// Result type alias using the common Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
