//! Security profile store

use storage::{ColumnDef, ColumnKind, Row, TableDef, Tables, Value};
use tracing::debug;

use crate::error::SettlementError;
use crate::types::SecurityProfile;
use crate::Result;

/// Per-symbol configuration: the maximum number of distinct holders
#[derive(Debug, Clone, Default)]
pub struct SecurityProfiles;

impl SecurityProfiles {
    pub const TABLE: &'static str = "SecurityProfile";

    pub fn new() -> Self {
        Self
    }

    pub fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::key("Symbol", ColumnKind::String),
                ColumnDef::attr("MaxNumberHolder", ColumnKind::Uint64),
            ],
        )
    }

    pub async fn create(&self, tables: &dyn Tables, symbol: &str, max_number_holder: u64) -> Result<()> {
        debug!(symbol, max_number_holder, "Creating security profile");
        if !tables
            .insert_row(Self::TABLE, row(symbol, max_number_holder))
            .await?
        {
            return Err(SettlementError::AlreadyAssigned(format!(
                "security profile {}",
                symbol
            )));
        }
        Ok(())
    }

    pub async fn update(&self, tables: &dyn Tables, symbol: &str, max_number_holder: u64) -> Result<()> {
        debug!(symbol, max_number_holder, "Updating security profile");
        if !tables
            .replace_row(Self::TABLE, row(symbol, max_number_holder))
            .await?
        {
            return Err(SettlementError::ProfileNotFound(symbol.to_string()));
        }
        Ok(())
    }

    pub async fn remove(&self, tables: &dyn Tables, symbol: &str) -> Result<()> {
        tables.delete_row(Self::TABLE, &[Value::from(symbol)]).await?;
        Ok(())
    }

    pub async fn find(&self, tables: &dyn Tables, symbol: &str) -> Result<Option<SecurityProfile>> {
        tables
            .get_row(Self::TABLE, &[Value::from(symbol)])
            .await?
            .map(|r| decode(&r))
            .transpose()
    }

    pub async fn max_number_holder(&self, tables: &dyn Tables, symbol: &str) -> Result<u64> {
        self.find(tables, symbol)
            .await?
            .map(|p| p.max_number_holder)
            .ok_or_else(|| SettlementError::ProfileNotFound(symbol.to_string()))
    }
}

fn row(symbol: &str, max_number_holder: u64) -> Row {
    Row::new(vec![Value::from(symbol), Value::from(max_number_holder)])
}

fn decode(row: &Row) -> Result<SecurityProfile> {
    Ok(SecurityProfile {
        symbol: row.string(0)?.to_string(),
        max_number_holder: row.u64(1)?,
    })
}
