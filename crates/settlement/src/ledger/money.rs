//! Account money ledger

use storage::{ColumnDef, ColumnKind, Row, TableDef, Tables, Value};
use tracing::debug;

use crate::error::SettlementError;
use crate::types::MoneyAccount;
use crate::Result;

/// Per-account cash balances
#[derive(Debug, Clone, Default)]
pub struct MoneyLedger;

impl MoneyLedger {
    pub const TABLE: &'static str = "AccountMoney";

    pub fn new() -> Self {
        Self
    }

    pub fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::key("AccountID", ColumnKind::String),
                ColumnDef::attr("Amount", ColumnKind::Uint64),
            ],
        )
    }

    /// Assign every seed account; fails on the first account that already exists
    pub async fn initialize(&self, tables: &dyn Tables, seed: &[(String, u64)]) -> Result<()> {
        for (account_id, amount) in seed {
            self.assign(tables, account_id, *amount).await?;
        }
        Ok(())
    }

    /// Create an account with an opening balance
    pub async fn assign(&self, tables: &dyn Tables, account_id: &str, amount: u64) -> Result<()> {
        debug!(account_id, amount, "Assigning money account");
        if !tables.insert_row(Self::TABLE, row(account_id, amount)).await? {
            return Err(SettlementError::AlreadyAssigned(format!(
                "money account {}",
                account_id
            )));
        }
        Ok(())
    }

    pub async fn find(&self, tables: &dyn Tables, account_id: &str) -> Result<Option<MoneyAccount>> {
        tables
            .get_row(Self::TABLE, &[Value::from(account_id)])
            .await?
            .map(|r| decode(&r))
            .transpose()
    }

    /// Current balance; a missing account is `AccountNotFound`, never zero
    pub async fn balance_of(&self, tables: &dyn Tables, account_id: &str) -> Result<u64> {
        self.find(tables, account_id)
            .await?
            .map(|a| a.amount)
            .ok_or_else(|| SettlementError::AccountNotFound(account_id.to_string()))
    }

    /// Add `amount` to an account, opening it when absent
    pub async fn credit(
        &self,
        tables: &dyn Tables,
        account_id: &str,
        amount: u64,
    ) -> Result<MoneyAccount> {
        let current = self.find(tables, account_id).await?.map_or(0, |a| a.amount);
        let amount = current.checked_add(amount).ok_or_else(|| {
            SettlementError::Overflow(format!("money balance of {}", account_id))
        })?;
        tables.upsert_row(Self::TABLE, row(account_id, amount)).await?;
        debug!(account_id, amount, "Money credited");
        Ok(MoneyAccount {
            account_id: account_id.to_string(),
            amount,
        })
    }

    /// Move `amount` from one account to another
    ///
    /// Both accounts must exist. Nothing is written when the source balance
    /// is short or when `amount` is 0.
    pub async fn transfer(
        &self,
        tables: &dyn Tables,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<()> {
        let from_balance = self.balance_of(tables, from).await?;
        let to_balance = self.balance_of(tables, to).await?;
        debug!(from, to, amount, from_balance, to_balance, "Transferring money");

        if amount > from_balance {
            return Err(SettlementError::InsufficientFunds {
                account_id: from.to_string(),
                required: amount,
                available: from_balance,
            });
        }
        if amount == 0 || from == to {
            return Ok(());
        }

        let credited = to_balance
            .checked_add(amount)
            .ok_or_else(|| SettlementError::Overflow(format!("money balance of {}", to)))?;
        tables
            .replace_row(Self::TABLE, row(from, from_balance - amount))
            .await?;
        tables.replace_row(Self::TABLE, row(to, credited)).await?;
        Ok(())
    }

    pub async fn remove(&self, tables: &dyn Tables, account_id: &str) -> Result<()> {
        tables
            .delete_row(Self::TABLE, &[Value::from(account_id)])
            .await?;
        Ok(())
    }
}

fn row(account_id: &str, amount: u64) -> Row {
    Row::new(vec![Value::from(account_id), Value::from(amount)])
}

fn decode(row: &Row) -> Result<MoneyAccount> {
    Ok(MoneyAccount {
        account_id: row.string(0)?.to_string(),
        amount: row.u64(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use storage::{InMemoryTableStore, TableStore};

    async fn ledger() -> (InMemoryTableStore, MoneyLedger) {
        let store = InMemoryTableStore::new();
        store.create_table(MoneyLedger::table_def()).await.unwrap();
        let money = MoneyLedger::new();
        money
            .initialize(&store, &[("A01".into(), 500), ("A02".into(), 100)])
            .await
            .unwrap();
        (store, money)
    }

    #[tokio::test]
    async fn test_assign_twice_fails() {
        let (store, money) = ledger().await;
        assert_matches!(
            money.assign(&store, "A01", 1).await,
            Err(SettlementError::AlreadyAssigned(_))
        );
        assert_eq!(money.balance_of(&store, "A01").await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_missing_is_not_zero() {
        let (store, money) = ledger().await;
        money.assign(&store, "A03", 0).await.unwrap();
        assert_eq!(money.balance_of(&store, "A03").await.unwrap(), 0);
        assert_matches!(
            money.balance_of(&store, "A99").await,
            Err(SettlementError::AccountNotFound(id)) if id == "A99"
        );
    }

    #[tokio::test]
    async fn test_transfer_conserves_supply() {
        let (store, money) = ledger().await;
        money.transfer(&store, "A01", "A02", 200).await.unwrap();
        assert_eq!(money.balance_of(&store, "A01").await.unwrap(), 300);
        assert_eq!(money.balance_of(&store, "A02").await.unwrap(), 300);

        money.transfer(&store, "A02", "A01", 300).await.unwrap();
        assert_eq!(money.balance_of(&store, "A01").await.unwrap(), 600);
        assert_eq!(money.balance_of(&store, "A02").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transfer_insufficient_leaves_balances() {
        let (store, money) = ledger().await;
        assert_matches!(
            money.transfer(&store, "A02", "A01", 101).await,
            Err(SettlementError::InsufficientFunds { required: 101, available: 100, .. })
        );
        assert_eq!(money.balance_of(&store, "A01").await.unwrap(), 500);
        assert_eq!(money.balance_of(&store, "A02").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_transfer_zero_and_self() {
        let (store, money) = ledger().await;
        money.transfer(&store, "A01", "A02", 0).await.unwrap();
        money.transfer(&store, "A01", "A01", 50).await.unwrap();
        assert_eq!(money.balance_of(&store, "A01").await.unwrap(), 500);
        assert_eq!(money.balance_of(&store, "A02").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_transfer_requires_both_accounts() {
        let (store, money) = ledger().await;
        assert_matches!(
            money.transfer(&store, "A01", "A99", 1).await,
            Err(SettlementError::AccountNotFound(_))
        );
        assert_eq!(money.balance_of(&store, "A01").await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_credit_opens_and_overflows() {
        let (store, money) = ledger().await;
        let opened = money.credit(&store, "A07", 42).await.unwrap();
        assert_eq!(opened.amount, 42);
        assert_eq!(money.credit(&store, "A07", 8).await.unwrap().amount, 50);
        assert_matches!(
            money.credit(&store, "A07", u64::MAX).await,
            Err(SettlementError::Overflow(_))
        );
        assert_eq!(money.balance_of(&store, "A07").await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_remove() {
        let (store, money) = ledger().await;
        money.remove(&store, "A02").await.unwrap();
        assert!(money.find(&store, "A02").await.unwrap().is_none());
    }
}
