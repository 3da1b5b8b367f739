use crate::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

const LOG_FORMATS: [&str; 3] = ["pretty", "json", "compact"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Service name is required")]
    MissingServiceName,

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Metrics are enabled but metrics.port is 0")]
    InvalidMetricsPort,

    #[error("{field} must not be empty")]
    EmptyIdentifier { field: String },

    #[error("Money account '{0}' is seeded more than once")]
    DuplicateMoneyAccount(String),

    #[error("Holding '{account_id}/{symbol}' is seeded more than once")]
    DuplicateHolding { account_id: String, symbol: String },

    #[error("Security profile '{0}' is seeded more than once")]
    DuplicateProfile(String),

    #[error("Environment variable placeholder left unresolved in {field}")]
    UnresolvedEnvVar { field: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &LedgerConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_service(config, &mut report);
    validate_seed(&config.seed, &mut report);

    report
}

fn validate_service(config: &LedgerConfig, report: &mut ValidationReport) {
    let name = config.service.name.trim();
    if name.is_empty() {
        report.add_error(ValidationError::MissingServiceName);
    } else if has_unresolved_env_vars(name) {
        report.add_error(ValidationError::UnresolvedEnvVar {
            field: "service.name".to_string(),
        });
    }

    let format = config.logging.format.to_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(
            config.logging.format.clone(),
        ));
    }
    if config.logging.format == default_log_format() {
        report.add_default("logging.format", &config.logging.format);
    }
    if config.logging.level == default_log_level() {
        report.add_default("logging.level", &config.logging.level);
    }

    if config.metrics.enabled && config.metrics.port == 0 {
        report.add_error(ValidationError::InvalidMetricsPort);
    }
}

fn check_identifier(field: &str, value: &str, report: &mut ValidationReport) {
    if value.trim().is_empty() {
        report.add_error(ValidationError::EmptyIdentifier {
            field: field.to_string(),
        });
    }
}

fn validate_seed(seed: &SeedConfig, report: &mut ValidationReport) {
    let mut accounts = HashSet::new();
    for (i, account) in seed.money_accounts.iter().enumerate() {
        check_identifier(
            &format!("seed.money_accounts[{}].account_id", i),
            &account.account_id,
            report,
        );
        if !accounts.insert(account.account_id.as_str()) {
            report.add_error(ValidationError::DuplicateMoneyAccount(
                account.account_id.clone(),
            ));
        }
    }

    let mut caps: HashMap<&str, u64> = HashMap::new();
    for (i, profile) in seed.security_profiles.iter().enumerate() {
        check_identifier(
            &format!("seed.security_profiles[{}].symbol", i),
            &profile.symbol,
            report,
        );
        if caps
            .insert(profile.symbol.as_str(), profile.max_number_holder)
            .is_some()
        {
            report.add_error(ValidationError::DuplicateProfile(profile.symbol.clone()));
        }
        if profile.max_number_holder == 0 {
            report.add_warning(
                &format!("seed.security_profiles[{}].max_number_holder", i),
                &format!("'{}' admits no holders; every trade will be rejected", profile.symbol),
            );
        }
    }

    let mut holdings = HashSet::new();
    let mut holders: HashMap<&str, usize> = HashMap::new();
    let mut unfunded = BTreeSet::new();
    for (i, holding) in seed.holdings.iter().enumerate() {
        check_identifier(
            &format!("seed.holdings[{}].account_id", i),
            &holding.account_id,
            report,
        );
        check_identifier(&format!("seed.holdings[{}].symbol", i), &holding.symbol, report);
        if !holdings.insert((holding.account_id.as_str(), holding.symbol.as_str())) {
            report.add_error(ValidationError::DuplicateHolding {
                account_id: holding.account_id.clone(),
                symbol: holding.symbol.clone(),
            });
        }
        if holding.balance > 0 {
            *holders.entry(holding.symbol.as_str()).or_default() += 1;
            if !accounts.contains(holding.account_id.as_str()) {
                unfunded.insert(holding.account_id.as_str());
            }
        }
    }

    for account_id in unfunded {
        report.add_warning(
            "seed.holdings",
            &format!(
                "'{}' holds shares but has no money account; its sales cannot settle",
                account_id
            ),
        );
    }

    let mut symbols: Vec<_> = holders.into_iter().collect();
    symbols.sort_unstable();
    for (symbol, count) in symbols {
        match caps.get(symbol) {
            None => report.add_warning(
                "seed.holdings",
                &format!("'{}' has holders but no security profile; it cannot be traded", symbol),
            ),
            Some(&cap) if count as u64 > cap => report.add_warning(
                "seed.holdings",
                &format!("'{}' starts with {} holders, above its cap of {}", symbol, count, cap),
            ),
            Some(_) => {}
        }
    }
}
