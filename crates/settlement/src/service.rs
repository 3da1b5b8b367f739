//! Settlement service - the entry-point operations of the ledger

use common::{parse_u64, require_non_empty, Caller};
use observability::LedgerMetrics;
use std::sync::Arc;
use storage::{StoreTransaction, TableStore};
use tracing::{info, warn};

use crate::error::SettlementError;
use crate::identity::{resolve_caller, IdentityProvider};
use crate::ledger::{HoldingLedger, MoneyLedger, SecurityProfiles, TransactionLedger};
use crate::operation::Operation;
use crate::types::{
    notional, Holding, MoneyAccount, SecurityProfile, Transaction, TransactionStatus,
};
use crate::Result;

/// Settlement service - composes the ledgers into authorized operations
///
/// Every operation resolves the caller first and checks its role against the
/// operation table. Each mutating operation runs inside one store
/// transaction: it either commits all of its writes or none.
pub struct SettlementService {
    store: Arc<dyn TableStore>,
    money: MoneyLedger,
    holdings: HoldingLedger,
    profiles: SecurityProfiles,
    transactions: TransactionLedger,
    metrics: LedgerMetrics,
}

impl SettlementService {
    /// Create a new SettlementService
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self::with_ledgers(
            store,
            MoneyLedger::new(),
            HoldingLedger::new(),
            SecurityProfiles::new(),
            TransactionLedger::new(),
        )
    }

    pub fn with_ledgers(
        store: Arc<dyn TableStore>,
        money: MoneyLedger,
        holdings: HoldingLedger,
        profiles: SecurityProfiles,
        transactions: TransactionLedger,
    ) -> Self {
        Self {
            store,
            money,
            holdings,
            profiles,
            transactions,
            metrics: LedgerMetrics::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    pub fn metrics(&self) -> &LedgerMetrics {
        &self.metrics
    }

    fn authorize(&self, operation: Operation, identity: &dyn IdentityProvider) -> Result<Caller> {
        let caller = resolve_caller(identity)?;
        if !operation.allows(caller.role) {
            return Err(SettlementError::InvalidRole {
                role: caller.role.to_string(),
                operation: operation.name(),
            });
        }
        Ok(caller)
    }

    /// Offer `volume` shares of `symbol` to `buyer_id` at `price` per share
    ///
    /// The caller is the seller. Creates a `Waiting` transaction.
    pub async fn sell(
        &self,
        identity: &dyn IdentityProvider,
        symbol: &str,
        buyer_id: &str,
        price: &str,
        volume: u64,
    ) -> Result<Transaction> {
        let caller = self.authorize(Operation::Sell, identity)?;
        require_non_empty("symbol", symbol)?;
        require_non_empty("buyerID", buyer_id)?;
        let price = parse_u64("price", price)?;
        if volume == 0 {
            return Err(SettlementError::InvalidArgument(
                "volume must be positive".to_string(),
            ));
        }
        if buyer_id == caller.account_id {
            return Err(SettlementError::InvalidArgument(format!(
                "{} cannot sell to itself",
                buyer_id
            )));
        }
        notional(price, volume)?;

        info!(
            seller_id = %caller.account_id,
            buyer_id,
            symbol,
            price,
            volume,
            "Recording sell offer"
        );

        let txn = self.store.begin().await?;
        let result = self
            .transactions
            .create(
                txn.as_tables(),
                symbol,
                buyer_id,
                &caller.account_id,
                &price.to_string(),
                volume,
            )
            .await;
        let tx = finish(txn, result).await?;

        self.metrics.trade_created();
        info!(transaction_id = tx.transaction_id, "Sell offer recorded");
        Ok(tx)
    }

    /// Settle a waiting trade as its buyer
    ///
    /// Flow:
    /// 1. Caller must be the recorded buyer and the trade must be `Waiting`
    /// 2. Check the symbol's holder cap
    /// 3. Move `price * volume` from buyer to seller
    /// 4. Move the shares from seller to buyer
    /// 5. Mark the trade `Confirmed`
    ///
    /// All steps share one store transaction; any failure leaves the ledger
    /// untouched and the trade `Waiting`.
    pub async fn confirm_buy(
        &self,
        identity: &dyn IdentityProvider,
        transaction_id: u64,
    ) -> Result<Transaction> {
        let caller = self.authorize(Operation::ConfirmBuy, identity)?;
        info!(transaction_id, buyer_id = %caller.account_id, "Confirming buy");

        let txn = self.store.begin().await?;
        let result = self.settle(&*txn, &caller, transaction_id).await;
        let tx = finish(txn, result).await?;

        self.metrics.trade_confirmed();
        info!(
            transaction_id,
            symbol = %tx.symbol,
            volume = tx.volume,
            "Trade settled"
        );
        Ok(tx)
    }

    async fn settle(
        &self,
        txn: &dyn StoreTransaction,
        caller: &Caller,
        transaction_id: u64,
    ) -> Result<Transaction> {
        let tables = txn.as_tables();
        let tx = self.transactions.get(tables, transaction_id).await?;

        if tx.buyer_id != caller.account_id {
            return Err(SettlementError::InvalidBuyer {
                caller: caller.account_id.clone(),
                transaction_id,
            });
        }
        if tx.status != TransactionStatus::Waiting {
            return Err(SettlementError::InvalidState {
                transaction_id,
                status: tx.status,
            });
        }
        let amount = tx.notional()?;

        let max_holders = self.profiles.max_number_holder(tables, &tx.symbol).await?;
        let allowed = self
            .holdings
            .validate_over_term_sheet_rules(
                tables,
                &tx.seller_id,
                &tx.buyer_id,
                &tx.symbol,
                tx.volume,
                max_holders,
            )
            .await?;
        if !allowed {
            self.metrics.termsheet_rejected();
            warn!(
                transaction_id,
                symbol = %tx.symbol,
                max_holders,
                "Trade does not pass term sheet validation"
            );
            return Err(SettlementError::TermSheetViolation {
                transaction_id,
                symbol: tx.symbol,
            });
        }

        self.money
            .transfer(tables, &tx.buyer_id, &tx.seller_id, amount)
            .await?;
        self.holdings
            .transfer(tables, &tx.seller_id, &tx.buyer_id, &tx.symbol, tx.volume)
            .await?;
        self.transactions
            .update_status(tables, transaction_id, TransactionStatus::Confirmed)
            .await
    }

    /// Withdraw from a waiting trade as either party
    pub async fn cancel(
        &self,
        identity: &dyn IdentityProvider,
        transaction_id: u64,
    ) -> Result<Transaction> {
        let caller = self.authorize(Operation::Cancel, identity)?;
        info!(transaction_id, caller = %caller, "Cancelling transaction");

        let txn = self.store.begin().await?;
        let result = self.cancel_in(&*txn, &caller, transaction_id).await;
        let tx = finish(txn, result).await?;

        let party = match tx.status {
            TransactionStatus::CancelledByBuyer => "buyer",
            _ => "seller",
        };
        self.metrics.trade_cancelled(party);
        info!(transaction_id, status = %tx.status, "Transaction cancelled");
        Ok(tx)
    }

    async fn cancel_in(
        &self,
        txn: &dyn StoreTransaction,
        caller: &Caller,
        transaction_id: u64,
    ) -> Result<Transaction> {
        let tables = txn.as_tables();
        let tx = self.transactions.get(tables, transaction_id).await?;

        let status = if caller.account_id == tx.buyer_id {
            TransactionStatus::CancelledByBuyer
        } else if caller.account_id == tx.seller_id {
            TransactionStatus::CancelledBySeller
        } else {
            return Err(SettlementError::InvalidParty {
                caller: caller.account_id.clone(),
                transaction_id,
            });
        };
        if tx.status != TransactionStatus::Waiting {
            return Err(SettlementError::InvalidState {
                transaction_id,
                status: tx.status,
            });
        }

        self.transactions
            .update_status(tables, transaction_id, status)
            .await
    }

    /// Mint new shares into an account
    pub async fn issue_stock(
        &self,
        identity: &dyn IdentityProvider,
        account_id: &str,
        symbol: &str,
        volume: u64,
    ) -> Result<Holding> {
        let caller = self.authorize(Operation::IssueStock, identity)?;
        require_non_empty("accountID", account_id)?;
        require_non_empty("symbol", symbol)?;
        if volume == 0 {
            return Err(SettlementError::InvalidArgument(
                "volume must be positive".to_string(),
            ));
        }
        info!(depository = %caller.account_id, account_id, symbol, volume, "Issuing stock");

        let txn = self.store.begin().await?;
        let result = self
            .holdings
            .issue(txn.as_tables(), account_id, symbol, volume)
            .await;
        finish(txn, result).await
    }

    /// Credit cash to an account, opening it when absent
    pub async fn add_money(
        &self,
        identity: &dyn IdentityProvider,
        account_id: &str,
        amount: u64,
    ) -> Result<MoneyAccount> {
        let caller = self.authorize(Operation::AddMoney, identity)?;
        require_non_empty("accountID", account_id)?;
        if amount == 0 {
            return Err(SettlementError::InvalidArgument(
                "amount must be positive".to_string(),
            ));
        }
        info!(operator = %caller.account_id, account_id, amount, "Adding money");

        let txn = self.store.begin().await?;
        let result = self.money.credit(txn.as_tables(), account_id, amount).await;
        finish(txn, result).await
    }

    /// Set a symbol's holder cap, creating its profile when absent
    pub async fn set_max_number_holder(
        &self,
        identity: &dyn IdentityProvider,
        symbol: &str,
        max_number_holder: u64,
    ) -> Result<SecurityProfile> {
        let caller = self.authorize(Operation::SetMaxNumberHolder, identity)?;
        require_non_empty("symbol", symbol)?;
        info!(depository = %caller.account_id, symbol, max_number_holder, "Setting holder cap");

        let txn = self.store.begin().await?;
        let result = self.upsert_profile(&*txn, symbol, max_number_holder).await;
        finish(txn, result).await
    }

    async fn upsert_profile(
        &self,
        txn: &dyn StoreTransaction,
        symbol: &str,
        max_number_holder: u64,
    ) -> Result<SecurityProfile> {
        let tables = txn.as_tables();
        if self.profiles.find(tables, symbol).await?.is_some() {
            self.profiles.update(tables, symbol, max_number_holder).await?;
        } else {
            self.profiles.create(tables, symbol, max_number_holder).await?;
        }
        Ok(SecurityProfile {
            symbol: symbol.to_string(),
            max_number_holder,
        })
    }

    /// The caller's transactions, or one of them by id
    pub async fn get_transaction(
        &self,
        identity: &dyn IdentityProvider,
        transaction_id: Option<u64>,
    ) -> Result<Vec<Transaction>> {
        let caller = self.authorize(Operation::GetTransaction, identity)?;
        let tables = self.store.as_tables();

        match transaction_id {
            None => self.transactions.find_by_account(tables, &caller.account_id).await,
            Some(transaction_id) => {
                let tx = self.transactions.get(tables, transaction_id).await?;
                if !tx.is_party(&caller.account_id) {
                    return Err(SettlementError::InvalidParty {
                        caller: caller.account_id,
                        transaction_id,
                    });
                }
                Ok(vec![tx])
            }
        }
    }

    /// The caller's share holdings
    pub async fn get_balance(&self, identity: &dyn IdentityProvider) -> Result<Vec<Holding>> {
        let caller = self.authorize(Operation::GetBalance, identity)?;
        self.holdings
            .holdings_of(self.store.as_tables(), &caller.account_id)
            .await
    }

    /// The caller's cash balance
    pub async fn get_money(&self, identity: &dyn IdentityProvider) -> Result<Vec<MoneyAccount>> {
        let caller = self.authorize(Operation::GetMoney, identity)?;
        let amount = self
            .money
            .balance_of(self.store.as_tables(), &caller.account_id)
            .await?;
        Ok(vec![MoneyAccount {
            account_id: caller.account_id,
            amount,
        }])
    }

    /// The caller's trades still `Waiting`
    pub async fn find_unconfirmed_transactions(
        &self,
        identity: &dyn IdentityProvider,
    ) -> Result<Vec<Transaction>> {
        let caller = self.authorize(Operation::FindUnconfirmedTransaction, identity)?;
        let txs = self
            .transactions
            .find_by_account(self.store.as_tables(), &caller.account_id)
            .await?;
        Ok(txs.into_iter().filter(|t| !t.status.is_terminal()).collect())
    }

    /// The caller's trades that reached a terminal status, confirmed or cancelled
    pub async fn find_completed_transactions(
        &self,
        identity: &dyn IdentityProvider,
    ) -> Result<Vec<Transaction>> {
        let caller = self.authorize(Operation::FindCompletedTransaction, identity)?;
        let txs = self
            .transactions
            .find_by_account(self.store.as_tables(), &caller.account_id)
            .await?;
        Ok(txs.into_iter().filter(|t| t.status.is_terminal()).collect())
    }

    pub async fn find_confirmed_transactions_by_symbol(
        &self,
        identity: &dyn IdentityProvider,
        symbol: &str,
    ) -> Result<Vec<Transaction>> {
        let caller = self.authorize(Operation::FindConfirmedTransactionBySymbol, identity)?;
        let txs = self
            .transactions
            .find_by_account_and_symbol(self.store.as_tables(), &caller.account_id, symbol)
            .await?;
        Ok(txs
            .into_iter()
            .filter(|t| t.status == TransactionStatus::Confirmed)
            .collect())
    }

    /// Accounts holding a positive balance of `symbol`
    pub async fn get_holders(
        &self,
        identity: &dyn IdentityProvider,
        symbol: &str,
    ) -> Result<Vec<Holding>> {
        self.authorize(Operation::GetHolders, identity)?;
        self.holdings
            .list_holders(self.store.as_tables(), symbol)
            .await
    }

    pub async fn get_max_number_holder(
        &self,
        identity: &dyn IdentityProvider,
        symbol: &str,
    ) -> Result<Vec<SecurityProfile>> {
        self.authorize(Operation::GetMaxNumberHolder, identity)?;
        let max_number_holder = self
            .profiles
            .max_number_holder(self.store.as_tables(), symbol)
            .await?;
        Ok(vec![SecurityProfile {
            symbol: symbol.to_string(),
            max_number_holder,
        }])
    }
}

/// Commit on success, roll back on failure
async fn finish<T>(txn: Box<dyn StoreTransaction>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = txn.rollback().await {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}
