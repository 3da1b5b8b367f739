//! Transaction ledger
//!
//! Trades are keyed by an id drawn from a shared counter in the store's
//! scalar state. A secondary index holds one `(AccountID, Symbol,
//! TransactionID)` row per party, so lookups by account and by account plus
//! symbol are both key-prefix scans. Index rows are never removed.

use chrono::{SecondsFormat, Utc};
use std::collections::BTreeSet;
use storage::{ColumnDef, ColumnKind, Row, TableDef, Tables, Value};
use tracing::debug;

use crate::error::SettlementError;
use crate::types::{Transaction, TransactionStatus};
use crate::Result;

/// Trade records and their status state machine
#[derive(Debug, Clone, Default)]
pub struct TransactionLedger;

impl TransactionLedger {
    pub const TABLE: &'static str = "Transaction";
    pub const INDEX_TABLE: &'static str = "AccountIDTx";
    /// Scalar state key of the id counter
    pub const COUNTER_KEY: &'static str = "CurrTransactionID";

    pub fn new() -> Self {
        Self
    }

    pub fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::key("TransactionID", ColumnKind::Uint64),
                ColumnDef::attr("Symbol", ColumnKind::String),
                ColumnDef::attr("BuyerID", ColumnKind::String),
                ColumnDef::attr("SellerID", ColumnKind::String),
                ColumnDef::attr("Price", ColumnKind::String),
                ColumnDef::attr("Volume", ColumnKind::Uint64),
                ColumnDef::attr("Status", ColumnKind::String),
                ColumnDef::attr("LastUpdated", ColumnKind::String),
            ],
        )
    }

    pub fn index_def() -> TableDef {
        TableDef::new(
            Self::INDEX_TABLE,
            vec![
                ColumnDef::key("AccountID", ColumnKind::String),
                ColumnDef::key("Symbol", ColumnKind::String),
                ColumnDef::key("TransactionID", ColumnKind::Uint64),
            ],
        )
    }

    /// Record a new `Waiting` trade and index it under both parties
    pub async fn create(
        &self,
        tables: &dyn Tables,
        symbol: &str,
        buyer_id: &str,
        seller_id: &str,
        price: &str,
        volume: u64,
    ) -> Result<Transaction> {
        let transaction_id = tables.next_sequence(Self::COUNTER_KEY).await?;
        let tx = Transaction {
            transaction_id,
            symbol: symbol.to_string(),
            buyer_id: buyer_id.to_string(),
            seller_id: seller_id.to_string(),
            price: price.to_string(),
            volume,
            status: TransactionStatus::Waiting,
            last_updated: now(),
        };

        if !tables.insert_row(Self::TABLE, encode(&tx)).await? {
            return Err(SettlementError::Internal(format!(
                "transaction id {} already in use",
                transaction_id
            )));
        }
        for party in [buyer_id, seller_id] {
            if !tables
                .insert_row(Self::INDEX_TABLE, index_row(party, symbol, transaction_id))
                .await?
            {
                return Err(SettlementError::Internal(format!(
                    "index entry for {} on transaction {} already exists",
                    party, transaction_id
                )));
            }
        }

        debug!(transaction_id, symbol, buyer_id, seller_id, volume, "Transaction inserted");
        Ok(tx)
    }

    pub async fn find(&self, tables: &dyn Tables, transaction_id: u64) -> Result<Option<Transaction>> {
        tables
            .get_row(Self::TABLE, &[Value::from(transaction_id)])
            .await?
            .map(|r| decode(&r))
            .transpose()
    }

    pub async fn get(&self, tables: &dyn Tables, transaction_id: u64) -> Result<Transaction> {
        self.find(tables, transaction_id)
            .await?
            .ok_or(SettlementError::TransactionNotFound(transaction_id))
    }

    /// Move a `Waiting` transaction to a terminal status
    pub async fn update_status(
        &self,
        tables: &dyn Tables,
        transaction_id: u64,
        status: TransactionStatus,
    ) -> Result<Transaction> {
        let mut tx = self.get(tables, transaction_id).await?;
        if !tx.status.can_transition_to(status) {
            return Err(SettlementError::InvalidTransition {
                transaction_id,
                from: tx.status,
                to: status,
            });
        }

        tx.status = status;
        tx.last_updated = now();
        if !tables.replace_row(Self::TABLE, encode(&tx)).await? {
            return Err(SettlementError::TransactionNotFound(transaction_id));
        }
        debug!(transaction_id, status = %status, "Transaction status updated");
        Ok(tx)
    }

    /// Every transaction where the account is buyer or seller, by id
    pub async fn find_by_account(&self, tables: &dyn Tables, account_id: &str) -> Result<Vec<Transaction>> {
        self.join(tables, &[Value::from(account_id)]).await
    }

    pub async fn find_by_account_and_symbol(
        &self,
        tables: &dyn Tables,
        account_id: &str,
        symbol: &str,
    ) -> Result<Vec<Transaction>> {
        self.join(tables, &[Value::from(account_id), Value::from(symbol)])
            .await
    }

    async fn join(&self, tables: &dyn Tables, prefix: &[Value]) -> Result<Vec<Transaction>> {
        let mut ids = BTreeSet::new();
        for r in tables.get_rows(Self::INDEX_TABLE, prefix).await? {
            ids.insert(r.u64(2)?);
        }

        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            // An index row without its transaction means the store lost a write
            let tx = self.find(tables, id).await?.ok_or_else(|| {
                SettlementError::Internal(format!("index references missing transaction {}", id))
            })?;
            found.push(tx);
        }
        Ok(found)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn index_row(account_id: &str, symbol: &str, transaction_id: u64) -> Row {
    Row::new(vec![
        Value::from(account_id),
        Value::from(symbol),
        Value::from(transaction_id),
    ])
}

fn encode(tx: &Transaction) -> Row {
    Row::new(vec![
        Value::from(tx.transaction_id),
        Value::from(&tx.symbol),
        Value::from(&tx.buyer_id),
        Value::from(&tx.seller_id),
        Value::from(&tx.price),
        Value::from(tx.volume),
        Value::from(tx.status.as_str()),
        Value::from(&tx.last_updated),
    ])
}

fn decode(row: &Row) -> Result<Transaction> {
    Ok(Transaction {
        transaction_id: row.u64(0)?,
        symbol: row.string(1)?.to_string(),
        buyer_id: row.string(2)?.to_string(),
        seller_id: row.string(3)?.to_string(),
        price: row.string(4)?.to_string(),
        volume: row.u64(5)?,
        status: row.string(6)?.parse()?,
        last_updated: row.string(7)?.to_string(),
    })
}
