//! Table store trait definitions

use async_trait::async_trait;

use crate::schema::{Row, TableDef, Value};
use crate::Result;

/// Row-level access to the tables and the scalar state area
///
/// Implemented by the store itself (committed state) and by
/// [`StoreTransaction`] (committed state overlaid with the transaction's own
/// pending writes), so ledger code is written once against `&dyn Tables`.
#[async_trait]
pub trait Tables: Send + Sync {
    /// Insert a new row
    ///
    /// # Returns
    /// `false` if a row with the same key already exists (nothing is written)
    async fn insert_row(&self, table: &str, row: Row) -> Result<bool>;

    /// Replace an existing row
    ///
    /// # Returns
    /// `false` if no row with that key exists (nothing is written)
    async fn replace_row(&self, table: &str, row: Row) -> Result<bool>;

    /// Insert the row, or replace it if the key already exists
    async fn upsert_row(&self, table: &str, row: Row) -> Result<()>;

    /// Point lookup by the full composite key
    async fn get_row(&self, table: &str, key: &[Value]) -> Result<Option<Row>>;

    /// Scan all rows whose key starts with `partial_key`
    ///
    /// An empty `partial_key` scans the whole table. Callers must not depend
    /// on the order of the returned rows.
    async fn get_rows(&self, table: &str, partial_key: &[Value]) -> Result<Vec<Row>>;

    /// Delete a row by its full key; deleting a missing row is not an error
    async fn delete_row(&self, table: &str, key: &[Value]) -> Result<()>;

    /// Read a scalar state entry
    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a scalar state entry
    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Atomically increment the counter stored under `key` and return the new value
    ///
    /// The counter is kept as decimal text. A missing counter starts at 0, so
    /// the first value handed out is 1.
    async fn next_sequence(&self, key: &str) -> Result<u64>;
}

/// A table store: [`Tables`] plus schema management and transactions
#[async_trait]
pub trait TableStore: Tables {
    /// View this store as plain [`Tables`]
    fn as_tables(&self) -> &dyn Tables;

    /// Create a table; creating an identical table twice is a no-op
    async fn create_table(&self, def: TableDef) -> Result<()>;

    /// Open a scoped transaction
    ///
    /// Writes made through the returned handle become visible to others only
    /// on [`StoreTransaction::commit`]. Dropping the handle without committing
    /// discards them.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// A scoped transaction over a [`TableStore`]
#[async_trait]
pub trait StoreTransaction: Tables {
    /// View this transaction as plain [`Tables`]
    fn as_tables(&self) -> &dyn Tables;

    /// Apply all pending writes atomically
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard all pending writes
    async fn rollback(self: Box<Self>) -> Result<()>;
}
