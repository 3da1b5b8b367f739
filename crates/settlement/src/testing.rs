//! Shared fixtures for the service and dispatch tests

use config::{HoldingSeed, MoneySeed, ProfileSeed, SeedConfig};
use std::sync::Arc;
use storage::InMemoryTableStore;

use crate::{initialize_ledger, SettlementService, StaticIdentity};

/// Cash: A01 1000, A02 1000, A03 50.
/// Shares: A01 holds 100 AAAA and 20 BBBB, A04 holds 10 AAAA.
/// Caps: AAAA 3, BBBB 1.
pub fn seed() -> SeedConfig {
    SeedConfig {
        money_accounts: vec![money("A01", 1_000), money("A02", 1_000), money("A03", 50)],
        holdings: vec![
            holding("A01", "AAAA", 100),
            holding("A01", "BBBB", 20),
            holding("A04", "AAAA", 10),
        ],
        security_profiles: vec![profile("AAAA", 3), profile("BBBB", 1)],
    }
}

pub async fn service() -> SettlementService {
    let store = Arc::new(InMemoryTableStore::new());
    initialize_ledger(store.as_ref(), &seed()).await.unwrap();
    SettlementService::new(store)
}

pub fn trader(account_id: &str) -> StaticIdentity {
    StaticIdentity::new(account_id, "trader")
}

pub fn issuer(account_id: &str) -> StaticIdentity {
    StaticIdentity::new(account_id, "issuer")
}

pub fn tsd() -> StaticIdentity {
    StaticIdentity::new("TSD", "tsd")
}

pub fn bot() -> StaticIdentity {
    StaticIdentity::new("BOT", "bot")
}

fn money(account_id: &str, amount: u64) -> MoneySeed {
    MoneySeed {
        account_id: account_id.into(),
        amount,
    }
}

fn holding(account_id: &str, symbol: &str, balance: u64) -> HoldingSeed {
    HoldingSeed {
        account_id: account_id.into(),
        symbol: symbol.into(),
        balance,
    }
}

fn profile(symbol: &str, max_number_holder: u64) -> ProfileSeed {
    ProfileSeed {
        symbol: symbol.into(),
        max_number_holder,
    }
}
