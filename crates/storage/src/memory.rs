//! In-memory table store implementation

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::StorageError;
use crate::schema::{Row, TableDef, Value};
use crate::traits::{StoreTransaction, TableStore, Tables};
use crate::Result;

type Key = Vec<Value>;

struct Table {
    def: TableDef,
    rows: BTreeMap<Key, Row>,
}

/// Committed state shared by the store handle and its transactions
struct Inner {
    tables: RwLock<HashMap<String, Table>>,
    state: RwLock<HashMap<String, Vec<u8>>>,
    /// Held by whoever is writing: a transaction for its whole lifetime, a
    /// direct write for the duration of one call.
    writer: Arc<AsyncMutex<()>>,
}

impl Inner {
    fn def(&self, table: &str) -> Result<TableDef> {
        self.tables
            .read()
            .get(table)
            .map(|t| t.def.clone())
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    fn get(&self, table: &str, key: &[Value]) -> Result<Option<Row>> {
        let tables = self.tables.read();
        let t = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        t.def.check_key(key)?;
        Ok(t.rows.get(key).cloned())
    }

    fn scan(&self, table: &str, prefix: &[Value]) -> Result<BTreeMap<Key, Row>> {
        let tables = self.tables.read();
        let t = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        t.def.check_key(prefix)?;
        Ok(t.rows
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect())
    }

    fn write(&self, table: &str, key: Key, row: Option<Row>) -> Result<()> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        match row {
            Some(row) => {
                t.rows.insert(key, row);
            }
            None => {
                t.rows.remove(&key);
            }
        }
        Ok(())
    }

    fn state(&self, key: &str) -> Option<Vec<u8>> {
        self.state.read().get(key).cloned()
    }
}

fn parse_counter(key: &str, raw: Option<Vec<u8>>) -> Result<u64> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    std::str::from_utf8(&raw)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| StorageError::corrupt(key, "counter is not decimal text"))
}

fn bump(key: &str, current: u64) -> Result<u64> {
    current
        .checked_add(1)
        .ok_or_else(|| StorageError::corrupt(key, "counter overflow"))
}

/// Checked row and key for a write against `def`
fn prepare(def: &TableDef, row: &Row) -> Result<Key> {
    def.check_row(row)?;
    Ok(row.key(def.key_len()))
}

fn check_full_key(def: &TableDef, key: &[Value]) -> Result<()> {
    def.check_key(key)?;
    if key.len() != def.key_len() {
        return Err(StorageError::Schema {
            table: def.name.clone(),
            message: format!("full key needs {} columns, got {}", def.key_len(), key.len()),
        });
    }
    Ok(())
}

/// In-memory table store
///
/// Rows live in one `BTreeMap` per table keyed by the key columns, which
/// makes key-prefix scans a range walk. Writers are serialized: a
/// transaction holds the writer lock from `begin` until commit/rollback,
/// and each direct write takes it for the duration of the call. Readers
/// always see committed state.
#[derive(Clone)]
pub struct InMemoryTableStore {
    inner: Arc<Inner>,
}

impl InMemoryTableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: RwLock::new(HashMap::new()),
                state: RwLock::new(HashMap::new()),
                writer: Arc::new(AsyncMutex::new(())),
            }),
        }
    }

    /// Number of committed rows in `table`
    pub fn row_count(&self, table: &str) -> Result<usize> {
        self.inner
            .tables
            .read()
            .get(table)
            .map(|t| t.rows.len())
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }
}

impl Default for InMemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tables for InMemoryTableStore {
    async fn insert_row(&self, table: &str, row: Row) -> Result<bool> {
        let _writer = self.inner.writer.lock().await;
        let key = prepare(&self.inner.def(table)?, &row)?;
        if self.inner.get(table, &key)?.is_some() {
            return Ok(false);
        }
        self.inner.write(table, key, Some(row))?;
        Ok(true)
    }

    async fn replace_row(&self, table: &str, row: Row) -> Result<bool> {
        let _writer = self.inner.writer.lock().await;
        let key = prepare(&self.inner.def(table)?, &row)?;
        if self.inner.get(table, &key)?.is_none() {
            return Ok(false);
        }
        self.inner.write(table, key, Some(row))?;
        Ok(true)
    }

    async fn upsert_row(&self, table: &str, row: Row) -> Result<()> {
        let _writer = self.inner.writer.lock().await;
        let key = prepare(&self.inner.def(table)?, &row)?;
        self.inner.write(table, key, Some(row))
    }

    async fn get_row(&self, table: &str, key: &[Value]) -> Result<Option<Row>> {
        check_full_key(&self.inner.def(table)?, key)?;
        self.inner.get(table, key)
    }

    async fn get_rows(&self, table: &str, partial_key: &[Value]) -> Result<Vec<Row>> {
        Ok(self.inner.scan(table, partial_key)?.into_values().collect())
    }

    async fn delete_row(&self, table: &str, key: &[Value]) -> Result<()> {
        let _writer = self.inner.writer.lock().await;
        check_full_key(&self.inner.def(table)?, key)?;
        self.inner.write(table, key.to_vec(), None)
    }

    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.state(key))
    }

    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let _writer = self.inner.writer.lock().await;
        self.inner.state.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn next_sequence(&self, key: &str) -> Result<u64> {
        let _writer = self.inner.writer.lock().await;
        let next = bump(key, parse_counter(key, self.inner.state(key))?)?;
        self.inner
            .state
            .write()
            .insert(key.to_string(), next.to_string().into_bytes());
        Ok(next)
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    fn as_tables(&self) -> &dyn Tables {
        self
    }

    async fn create_table(&self, def: TableDef) -> Result<()> {
        def.check()?;
        let _writer = self.inner.writer.lock().await;
        let mut tables = self.inner.tables.write();
        match tables.get(&def.name) {
            Some(existing) if existing.def == def => Ok(()),
            Some(_) => Err(StorageError::TableConflict(def.name.clone())),
            None => {
                debug!(table = %def.name, columns = def.columns.len(), "Creating table");
                tables.insert(
                    def.name.clone(),
                    Table {
                        def,
                        rows: BTreeMap::new(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = self.inner.writer.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            inner: self.inner.clone(),
            _writer: guard,
            pending: Mutex::new(Pending::default()),
        }))
    }
}

/// Writes buffered by a transaction; `None` marks a deletion
#[derive(Default)]
struct Pending {
    rows: HashMap<String, BTreeMap<Key, Option<Row>>>,
    state: HashMap<String, Vec<u8>>,
}

impl Pending {
    fn writes(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum::<usize>() + self.state.len()
    }
}

struct MemoryTransaction {
    inner: Arc<Inner>,
    _writer: OwnedMutexGuard<()>,
    pending: Mutex<Pending>,
}

impl MemoryTransaction {
    fn lookup(&self, table: &str, key: &[Value]) -> Result<Option<Row>> {
        if let Some(entry) = self
            .pending
            .lock()
            .rows
            .get(table)
            .and_then(|rows| rows.get(key))
        {
            return Ok(entry.clone());
        }
        self.inner.get(table, key)
    }

    fn stage(&self, table: &str, key: Key, row: Option<Row>) {
        self.pending
            .lock()
            .rows
            .entry(table.to_string())
            .or_default()
            .insert(key, row);
    }

    fn state(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(value) = self.pending.lock().state.get(key) {
            return Some(value.clone());
        }
        self.inner.state(key)
    }
}

#[async_trait]
impl Tables for MemoryTransaction {
    async fn insert_row(&self, table: &str, row: Row) -> Result<bool> {
        let key = prepare(&self.inner.def(table)?, &row)?;
        if self.lookup(table, &key)?.is_some() {
            return Ok(false);
        }
        self.stage(table, key, Some(row));
        Ok(true)
    }

    async fn replace_row(&self, table: &str, row: Row) -> Result<bool> {
        let key = prepare(&self.inner.def(table)?, &row)?;
        if self.lookup(table, &key)?.is_none() {
            return Ok(false);
        }
        self.stage(table, key, Some(row));
        Ok(true)
    }

    async fn upsert_row(&self, table: &str, row: Row) -> Result<()> {
        let key = prepare(&self.inner.def(table)?, &row)?;
        self.stage(table, key, Some(row));
        Ok(())
    }

    async fn get_row(&self, table: &str, key: &[Value]) -> Result<Option<Row>> {
        check_full_key(&self.inner.def(table)?, key)?;
        self.lookup(table, key)
    }

    async fn get_rows(&self, table: &str, partial_key: &[Value]) -> Result<Vec<Row>> {
        let mut rows = self.inner.scan(table, partial_key)?;
        let pending = self.pending.lock();
        if let Some(staged) = pending.rows.get(table) {
            for (key, entry) in staged
                .range(partial_key.to_vec()..)
                .take_while(|(k, _)| k.starts_with(partial_key))
            {
                match entry {
                    Some(row) => {
                        rows.insert(key.clone(), row.clone());
                    }
                    None => {
                        rows.remove(key);
                    }
                }
            }
        }
        Ok(rows.into_values().collect())
    }

    async fn delete_row(&self, table: &str, key: &[Value]) -> Result<()> {
        check_full_key(&self.inner.def(table)?, key)?;
        self.stage(table, key.to_vec(), None);
        Ok(())
    }

    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.state(key))
    }

    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.pending.lock().state.insert(key.to_string(), value);
        Ok(())
    }

    async fn next_sequence(&self, key: &str) -> Result<u64> {
        let next = bump(key, parse_counter(key, self.state(key))?)?;
        self.pending
            .lock()
            .state
            .insert(key.to_string(), next.to_string().into_bytes());
        Ok(next)
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    fn as_tables(&self) -> &dyn Tables {
        self
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let pending = std::mem::take(&mut *self.pending.lock());
        let writes = pending.writes();
        {
            let mut tables = self.inner.tables.write();
            for (name, staged) in pending.rows {
                let table = tables
                    .get_mut(&name)
                    .ok_or_else(|| StorageError::TableNotFound(name.clone()))?;
                for (key, entry) in staged {
                    match entry {
                        Some(row) => {
                            table.rows.insert(key, row);
                        }
                        None => {
                            table.rows.remove(&key);
                        }
                    }
                }
            }
        }
        self.inner.state.write().extend(pending.state);
        debug!(writes, "Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        debug!(discarded = self.pending.lock().writes(), "Transaction rolled back");
        Ok(())
    }
}
