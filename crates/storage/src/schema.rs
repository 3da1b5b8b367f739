//! Column and row model
//!
//! A table is a list of typed columns; the leading columns flagged as keys
//! form the composite primary key. Rows carry values in column order.

use std::fmt;

use crate::error::StorageError;
use crate::Result;

/// Column value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    String,
    Uint64,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::String => write!(f, "string"),
            ColumnKind::Uint64 => write!(f, "uint64"),
        }
    }
}

/// A single column value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Str(String),
    U64(u64),
}

impl Value {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Str(_) => ColumnKind::String,
            Value::U64(_) => ColumnKind::Uint64,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Str(value.clone())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::U64(value)
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
    pub key: bool,
}

impl ColumnDef {
    /// Key column
    pub fn key(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            key: true,
        }
    }

    /// Non-key attribute column
    pub fn attr(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            key: false,
        }
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: &str, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.to_string(),
            columns,
        }
    }

    /// Number of leading key columns
    pub fn key_len(&self) -> usize {
        self.columns.iter().take_while(|c| c.key).count()
    }

    /// Check that the definition is usable: at least one key column and all
    /// key columns ahead of the attributes.
    pub fn check(&self) -> Result<()> {
        let key_len = self.key_len();
        if key_len == 0 {
            return Err(StorageError::schema(&self.name, "table needs a key column"));
        }
        if self.columns[key_len..].iter().any(|c| c.key) {
            return Err(StorageError::schema(
                &self.name,
                "key columns must precede attribute columns",
            ));
        }
        Ok(())
    }

    /// Validate a full row against this definition
    pub fn check_row(&self, row: &Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(StorageError::schema(
                &self.name,
                format!("expected {} columns, got {}", self.columns.len(), row.len()),
            ));
        }
        self.check_kinds(row.values())
    }

    /// Validate a (possibly partial) key against this definition
    pub fn check_key(&self, key: &[Value]) -> Result<()> {
        if key.len() > self.key_len() {
            return Err(StorageError::schema(
                &self.name,
                format!("key has {} columns, table key has {}", key.len(), self.key_len()),
            ));
        }
        self.check_kinds(key)
    }

    fn check_kinds(&self, values: &[Value]) -> Result<()> {
        for (column, value) in self.columns.iter().zip(values) {
            if column.kind != value.kind() {
                return Err(StorageError::schema(
                    &self.name,
                    format!(
                        "column {} expects {}, got {}",
                        column.name,
                        column.kind,
                        value.kind()
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// A stored row, values in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Leading `key_len` values
    pub fn key(&self, key_len: usize) -> Vec<Value> {
        self.0.iter().take(key_len).cloned().collect()
    }

    /// String column at `idx`
    pub fn string(&self, idx: usize) -> Result<&str> {
        match self.0.get(idx) {
            Some(Value::Str(s)) => Ok(s),
            other => Err(StorageError::corrupt(
                &format!("column {}", idx),
                format!("expected string, found {:?}", other),
            )),
        }
    }

    /// Unsigned column at `idx`
    pub fn u64(&self, idx: usize) -> Result<u64> {
        match self.0.get(idx) {
            Some(Value::U64(v)) => Ok(*v),
            other => Err(StorageError::corrupt(
                &format!("column {}", idx),
                format!("expected uint64, found {:?}", other),
            )),
        }
    }
}
