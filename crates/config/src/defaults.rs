use crate::{HoldingSeed, MoneySeed, ProfileSeed, SeedConfig};

pub const DEFAULT_SEED_MONEY: u64 = 100_000;
pub const DEFAULT_SEED_SHARES: u64 = 1_000;
pub const DEFAULT_MAX_NUMBER_HOLDER: u64 = 10;

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}

pub fn default_service_name() -> String {
    "setl".to_string()
}

/// Genesis ledger: ten funded buyer accounts, five funded share accounts
/// holding four symbols, and five security profiles.
///
/// The share accounts get money accounts too, since a confirmed sale pays
/// the seller.
pub fn default_seed() -> SeedConfig {
    let buyers = (1..=10).map(|n| format!("A{:02}", n));
    let sellers = (1..=5).map(|n| format!("AA{:02}", n));
    let money_accounts = buyers
        .chain(sellers)
        .map(|account_id| MoneySeed {
            account_id,
            amount: DEFAULT_SEED_MONEY,
        })
        .collect();

    let holdings = (1..=5)
        .flat_map(|n| {
            ["AAAA", "BBBB", "CCCC", "DDDD"]
                .into_iter()
                .map(move |symbol| HoldingSeed {
                    account_id: format!("AA{:02}", n),
                    symbol: symbol.to_string(),
                    balance: DEFAULT_SEED_SHARES,
                })
        })
        .collect();

    let security_profiles = ["AAAA", "BBBB", "CCCC", "DDDD", "EEEE"]
        .into_iter()
        .map(|symbol| ProfileSeed {
            symbol: symbol.to_string(),
            max_number_holder: DEFAULT_MAX_NUMBER_HOLDER,
        })
        .collect();

    SeedConfig {
        money_accounts,
        holdings,
        security_profiles,
    }
}
