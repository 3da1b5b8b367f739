//! Account holding ledger and the term-sheet holder-cap check

use storage::{ColumnDef, ColumnKind, Row, TableDef, Tables, Value};
use tracing::debug;

use crate::error::SettlementError;
use crate::types::Holding;
use crate::Result;

/// Per-(account, symbol) share balances
#[derive(Debug, Clone, Default)]
pub struct HoldingLedger;

impl HoldingLedger {
    pub const TABLE: &'static str = "AccountBalance";

    pub fn new() -> Self {
        Self
    }

    pub fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::key("AccountID", ColumnKind::String),
                ColumnDef::key("Symbol", ColumnKind::String),
                ColumnDef::attr("Balance", ColumnKind::Uint64),
            ],
        )
    }

    /// Set a balance, creating the row when absent
    pub async fn upsert(
        &self,
        tables: &dyn Tables,
        account_id: &str,
        symbol: &str,
        balance: u64,
    ) -> Result<()> {
        tables
            .upsert_row(Self::TABLE, row(account_id, symbol, balance))
            .await?;
        Ok(())
    }

    pub async fn find(
        &self,
        tables: &dyn Tables,
        account_id: &str,
        symbol: &str,
    ) -> Result<Option<Holding>> {
        tables
            .get_row(Self::TABLE, &[Value::from(account_id), Value::from(symbol)])
            .await?
            .map(|r| decode(&r))
            .transpose()
    }

    pub async fn balance_of(&self, tables: &dyn Tables, account_id: &str, symbol: &str) -> Result<u64> {
        self.find(tables, account_id, symbol)
            .await?
            .map(|h| h.balance)
            .ok_or_else(|| SettlementError::HoldingNotFound {
                account_id: account_id.to_string(),
                symbol: symbol.to_string(),
            })
    }

    /// Mint `volume` new shares into an account
    pub async fn issue(
        &self,
        tables: &dyn Tables,
        account_id: &str,
        symbol: &str,
        volume: u64,
    ) -> Result<Holding> {
        let current = self
            .find(tables, account_id, symbol)
            .await?
            .map_or(0, |h| h.balance);
        let balance = current.checked_add(volume).ok_or_else(|| {
            SettlementError::Overflow(format!("{} balance of {}", symbol, account_id))
        })?;
        self.upsert(tables, account_id, symbol, balance).await?;
        debug!(account_id, symbol, volume, balance, "Shares issued");
        Ok(Holding {
            account_id: account_id.to_string(),
            symbol: symbol.to_string(),
            balance,
        })
    }

    /// Every holding row of one account, including zero balances
    pub async fn holdings_of(&self, tables: &dyn Tables, account_id: &str) -> Result<Vec<Holding>> {
        tables
            .get_rows(Self::TABLE, &[Value::from(account_id)])
            .await?
            .iter()
            .map(decode)
            .collect()
    }

    /// Accounts with a positive balance of `symbol`, in scan order
    pub async fn list_holders(&self, tables: &dyn Tables, symbol: &str) -> Result<Vec<Holding>> {
        Ok(self
            .symbol_rows(tables, symbol)
            .await?
            .into_iter()
            .filter(|h| h.balance > 0)
            .collect())
    }

    /// Move `volume` shares of `symbol` from seller to buyer
    ///
    /// The buyer's row is created when absent.
    pub async fn transfer(
        &self,
        tables: &dyn Tables,
        seller_id: &str,
        buyer_id: &str,
        symbol: &str,
        volume: u64,
    ) -> Result<()> {
        let seller_balance = self
            .find(tables, seller_id, symbol)
            .await?
            .ok_or_else(|| SettlementError::SellerNotFound {
                account_id: seller_id.to_string(),
                symbol: symbol.to_string(),
            })?
            .balance;
        if seller_balance < volume {
            return Err(SettlementError::InsufficientHolding {
                account_id: seller_id.to_string(),
                symbol: symbol.to_string(),
                required: volume,
                available: seller_balance,
            });
        }
        if seller_id == buyer_id {
            return Ok(());
        }

        let buyer_balance = self
            .find(tables, buyer_id, symbol)
            .await?
            .map_or(0, |h| h.balance);
        let credited = buyer_balance.checked_add(volume).ok_or_else(|| {
            SettlementError::Overflow(format!("{} balance of {}", symbol, buyer_id))
        })?;

        debug!(seller_id, buyer_id, symbol, volume, "Transferring shares");
        self.upsert(tables, seller_id, symbol, seller_balance - volume)
            .await?;
        self.upsert(tables, buyer_id, symbol, credited).await
    }

    /// Run the holder-cap check over the current holdings of `symbol`
    pub async fn validate_over_term_sheet_rules(
        &self,
        tables: &dyn Tables,
        seller_id: &str,
        buyer_id: &str,
        symbol: &str,
        volume: u64,
        max_holders_allowed: u64,
    ) -> Result<bool> {
        let rows = self.symbol_rows(tables, symbol).await?;
        let allowed =
            term_sheet_allows(&rows, seller_id, buyer_id, symbol, volume, max_holders_allowed);
        debug!(
            symbol,
            seller_id,
            buyer_id,
            volume,
            max_holders_allowed,
            allowed,
            "Term sheet validation"
        );
        Ok(allowed)
    }

    async fn symbol_rows(&self, tables: &dyn Tables, symbol: &str) -> Result<Vec<Holding>> {
        let mut holdings = Vec::new();
        for r in tables.get_rows(Self::TABLE, &[]).await? {
            let holding = decode(&r)?;
            if holding.symbol == symbol {
                holdings.push(holding);
            }
        }
        Ok(holdings)
    }
}

/// Holder-cap compliance check
///
/// Counts the distinct positive holders of `symbol` after the trade, with one
/// slot reserved for the buyer. A seller selling out exactly leaves the set;
/// a buyer who already holds is not counted twice and bypasses the cap.
/// The seller must hold at least `volume`.
pub fn term_sheet_allows(
    holdings: &[Holding],
    seller_id: &str,
    buyer_id: &str,
    symbol: &str,
    volume: u64,
    max_holders_allowed: u64,
) -> bool {
    let mut projected_holders: u64 = 1;
    let mut seller_is_valid = false;
    let mut buyer_already_holds = false;

    for h in holdings
        .iter()
        .filter(|h| h.symbol == symbol && h.balance > 0)
    {
        projected_holders += 1;

        if h.account_id == seller_id && h.balance >= volume {
            seller_is_valid = true;
            if h.balance == volume {
                projected_holders = projected_holders.saturating_sub(1);
            }
        }

        if h.account_id == buyer_id {
            buyer_already_holds = true;
            projected_holders = projected_holders.saturating_sub(1);
        }
    }

    seller_is_valid && (buyer_already_holds || projected_holders <= max_holders_allowed)
}

fn row(account_id: &str, symbol: &str, balance: u64) -> Row {
    Row::new(vec![
        Value::from(account_id),
        Value::from(symbol),
        Value::from(balance),
    ])
}

fn decode(row: &Row) -> Result<Holding> {
    Ok(Holding {
        account_id: row.string(0)?.to_string(),
        symbol: row.string(1)?.to_string(),
        balance: row.u64(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use storage::{InMemoryTableStore, TableStore};

    fn h(account: &str, balance: u64) -> Holding {
        Holding {
            account_id: account.into(),
            symbol: "S".into(),
            balance,
        }
    }

    async fn ledger() -> (InMemoryTableStore, HoldingLedger) {
        let store = InMemoryTableStore::new();
        store.create_table(HoldingLedger::table_def()).await.unwrap();
        let holdings = HoldingLedger::new();
        holdings.upsert(&store, "A", "S", 10).await.unwrap();
        holdings.upsert(&store, "B", "S", 5).await.unwrap();
        holdings.upsert(&store, "A", "T", 3).await.unwrap();
        (store, holdings)
    }

    #[test]
    fn test_full_exit_frees_a_slot() {
        let rows = [h("A", 10), h("B", 5)];
        assert!(term_sheet_allows(&rows, "A", "C", "S", 10, 2));
    }

    #[test]
    fn test_new_buyer_over_cap() {
        let rows = [h("A", 10), h("B", 5)];
        assert!(!term_sheet_allows(&rows, "A", "C", "S", 4, 2));
        assert!(term_sheet_allows(&rows, "A", "C", "S", 4, 3));
    }

    #[test]
    fn test_existing_holder_bypasses_cap() {
        let rows = [h("A", 10), h("B", 5), h("C", 1)];
        assert!(term_sheet_allows(&rows, "A", "B", "S", 4, 1));
    }

    #[test]
    fn test_seller_must_hold_volume() {
        let rows = [h("A", 10), h("B", 5)];
        assert!(!term_sheet_allows(&rows, "A", "B", "S", 11, 10));
        assert!(!term_sheet_allows(&rows, "Z", "B", "S", 1, 10));
    }

    #[test]
    fn test_zero_and_foreign_rows_ignored() {
        let rows = [
            h("A", 10),
            h("B", 0),
            Holding {
                account_id: "D".into(),
                symbol: "T".into(),
                balance: 50,
            },
        ];
        assert!(term_sheet_allows(&rows, "A", "C", "S", 1, 2));
        assert!(!term_sheet_allows(&rows, "A", "C", "S", 1, 1));
    }

    #[tokio::test]
    async fn test_issue_creates_and_adds() {
        let (store, holdings) = ledger().await;
        assert_eq!(holdings.issue(&store, "C", "S", 7).await.unwrap().balance, 7);
        assert_eq!(holdings.issue(&store, "C", "S", 3).await.unwrap().balance, 10);
        assert_eq!(holdings.balance_of(&store, "C", "S").await.unwrap(), 10);
        assert_eq!(holdings.balance_of(&store, "A", "S").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_balance_of_missing() {
        let (store, holdings) = ledger().await;
        assert_matches!(
            holdings.balance_of(&store, "B", "T").await,
            Err(SettlementError::HoldingNotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_holdings_of_account() {
        let (store, holdings) = ledger().await;
        let mut symbols: Vec<_> = holdings
            .holdings_of(&store, "A")
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.symbol)
            .collect();
        symbols.sort();
        assert_eq!(symbols, vec!["S", "T"]);
    }

    #[tokio::test]
    async fn test_transfer_to_new_buyer() {
        let (store, holdings) = ledger().await;
        holdings.transfer(&store, "A", "C", "S", 4).await.unwrap();
        assert_eq!(holdings.balance_of(&store, "A", "S").await.unwrap(), 6);
        assert_eq!(holdings.balance_of(&store, "C", "S").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_full_sale_leaves_holder_set() {
        let (store, holdings) = ledger().await;
        holdings.transfer(&store, "B", "A", "S", 5).await.unwrap();
        assert_eq!(holdings.balance_of(&store, "B", "S").await.unwrap(), 0);

        let holders = holdings.list_holders(&store, "S").await.unwrap();
        assert_eq!(holders, vec![h("A", 15)]);
    }

    #[tokio::test]
    async fn test_transfer_failures_leave_balances() {
        let (store, holdings) = ledger().await;
        assert_matches!(
            holdings.transfer(&store, "C", "A", "S", 1).await,
            Err(SettlementError::SellerNotFound { .. })
        );
        assert_matches!(
            holdings.transfer(&store, "B", "A", "S", 6).await,
            Err(SettlementError::InsufficientHolding { required: 6, available: 5, .. })
        );
        assert_eq!(holdings.balance_of(&store, "A", "S").await.unwrap(), 10);
        assert_eq!(holdings.balance_of(&store, "B", "S").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_validate_reads_store() {
        let (store, holdings) = ledger().await;
        assert!(holdings
            .validate_over_term_sheet_rules(&store, "A", "C", "S", 10, 2)
            .await
            .unwrap());
        assert!(!holdings
            .validate_over_term_sheet_rules(&store, "A", "C", "S", 9, 2)
            .await
            .unwrap());
    }
}
