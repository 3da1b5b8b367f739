use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Root of the YAML configuration file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// pretty, json or compact
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Fallback filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

/// Genesis data written into an empty ledger
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub money_accounts: Vec<MoneySeed>,
    #[serde(default)]
    pub holdings: Vec<HoldingSeed>,
    #[serde(default)]
    pub security_profiles: Vec<ProfileSeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MoneySeed {
    pub account_id: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HoldingSeed {
    pub account_id: String,
    pub symbol: String,
    pub balance: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProfileSeed {
    pub symbol: String,
    pub max_number_holder: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_config() {
        let yaml = include_str!("../../../setl.yaml");
        let cfg: LedgerConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(cfg.service.name, "setl");
        assert_eq!(cfg.logging.format, "pretty");
        assert!(!cfg.metrics.enabled);
        assert_eq!(cfg.seed.money_accounts.len(), 15);
        assert_eq!(cfg.seed.holdings.len(), 20);
        assert_eq!(cfg.seed.security_profiles.len(), 5);
        assert_eq!(
            cfg.seed.security_profiles[0],
            ProfileSeed {
                symbol: "AAAA".to_string(),
                max_number_holder: 10,
            }
        );
    }

    #[test]
    fn test_sections_default() {
        let cfg: LedgerConfig = serde_yaml::from_str("service:\n  name: test\n").unwrap();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.metrics.port, 9090);
        assert!(cfg.seed.money_accounts.is_empty());
    }
}
