//! Table store abstraction for the settlement ledger
//!
//! The ledgers never talk to a concrete database. They are written against
//! the [`Tables`] trait, which offers point lookups by composite key, key-prefix
//! scans, insert/replace/upsert/delete and a small scalar state area. A
//! [`TableStore`] can additionally create tables and open a
//! [`StoreTransaction`], which implements [`Tables`] itself so ledger code runs
//! unchanged inside or outside a transaction.
//!
//! # Backends
//!
//! - [`InMemoryTableStore`] - single-writer in-memory engine used by the
//!   binary and the tests

pub mod error;
pub mod memory;
pub mod schema;
pub mod traits;

pub use error::StorageError;
pub use memory::InMemoryTableStore;
pub use schema::{ColumnDef, ColumnKind, Row, TableDef, Value};
pub use traits::{StoreTransaction, TableStore, Tables};

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
