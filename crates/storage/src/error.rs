//! Storage error types

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Table was never created
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Table exists with a different definition
    #[error("Table {0} already exists with a different definition")]
    TableConflict(String),

    /// Row does not match the table definition
    #[error("Schema violation on {table}: {message}")]
    Schema { table: String, message: String },

    /// Stored value could not be decoded
    #[error("Corrupt value for {key}: {message}")]
    Corrupt { key: String, message: String },

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl StorageError {
    pub(crate) fn schema(table: &str, message: impl Into<String>) -> Self {
        Self::Schema {
            table: table.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn corrupt(key: &str, message: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
