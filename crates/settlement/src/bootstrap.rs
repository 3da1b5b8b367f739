//! Ledger bootstrap: table creation and genesis seed

use config::SeedConfig;
use storage::TableStore;
use tracing::{info, instrument};

use crate::ledger::{HoldingLedger, MoneyLedger, SecurityProfiles, TransactionLedger};
use crate::Result;

/// Create the five ledger tables and write the seed in one transaction
///
/// Table creation is idempotent. Seeding an account or profile that already
/// exists fails with `AlreadyAssigned` and writes nothing.
#[instrument(skip_all, fields(
    money_accounts = seed.money_accounts.len(),
    holdings = seed.holdings.len(),
    profiles = seed.security_profiles.len()
))]
pub async fn initialize_ledger(store: &dyn TableStore, seed: &SeedConfig) -> Result<()> {
    for def in [
        MoneyLedger::table_def(),
        HoldingLedger::table_def(),
        SecurityProfiles::table_def(),
        TransactionLedger::table_def(),
        TransactionLedger::index_def(),
    ] {
        store.create_table(def).await?;
    }

    let money = MoneyLedger::new();
    let holdings = HoldingLedger::new();
    let profiles = SecurityProfiles::new();

    let txn = store.begin().await?;
    {
        let tables = txn.as_tables();
        for h in &seed.holdings {
            holdings.upsert(tables, &h.account_id, &h.symbol, h.balance).await?;
        }
        let accounts: Vec<(String, u64)> = seed
            .money_accounts
            .iter()
            .map(|m| (m.account_id.clone(), m.amount))
            .collect();
        money.initialize(tables, &accounts).await?;
        for p in &seed.security_profiles {
            profiles.create(tables, &p.symbol, p.max_number_holder).await?;
        }
    }
    txn.commit().await?;

    info!("Ledger initialized");
    Ok(())
}
