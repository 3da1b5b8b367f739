//! Settlement ledger binary
//!
//! Commands for initializing and validating a configuration, listing the
//! ledger operations, and replaying a call script against a freshly seeded
//! in-memory ledger.

mod script;

use anyhow::{Context, Result};
use cli::{Cli, Commands};
use config::{
    generate_default_config, load_config, save_config, validate_config, LedgerConfig,
};
use observability::{init_logging, init_metrics, LogFormat};
use script::Call;
use settlement::{dispatch, initialize_ledger, SettlementService, StaticIdentity, OPERATIONS};
use std::path::Path;
use std::sync::Arc;
use storage::InMemoryTableStore;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Run {
            config,
            script,
            fail_fast,
        } => run_command(config, script, fail_fast).await,
        Commands::Validate { config } => {
            init_logging("setl", LogFormat::Pretty, "info")?;
            info!("Executing 'validate' command");
            validate_command(config).await
        }
        Commands::Init { output } => {
            init_logging("setl", LogFormat::Pretty, "info")?;
            info!("Executing 'init' command");
            init_command(output).await
        }
        Commands::Operations => {
            operations_command();
            Ok(())
        }
    }
}

/// Load and validate, logging warnings; errors abort
fn load_valid_config(config_path: &Path) -> Result<LedgerConfig> {
    let config = load_config(config_path)?;
    let report = validate_config(&config);

    if !report.warnings.is_empty() {
        warn!("Configuration warnings:");
        for warning in &report.warnings {
            warn!(field = %warning.field, message = %warning.message);
        }
    }

    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot run due to configuration errors");
    }
    Ok(config)
}

async fn run_command<P: AsRef<Path>>(config_path: P, script_path: P, fail_fast: bool) -> Result<()> {
    let config_path = config_path.as_ref();
    let script_path = script_path.as_ref();

    // Logging settings come from the file itself, so peek at it first
    let config = load_config(config_path)?;
    let format = LogFormat::parse(&config.logging.format).unwrap_or_default();
    init_logging(&config.service.name, format, &config.logging.level)?;
    info!(path = ?config_path, "Executing 'run' command");

    let config = load_valid_config(config_path)?;
    if config.metrics.enabled {
        init_metrics(config.metrics.port)?;
    }

    let text = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read script: {:?}", script_path))?;
    let calls = script::parse_script(&text)?;
    debug!(calls = calls.len(), "Script parsed");

    let store = Arc::new(InMemoryTableStore::new());
    initialize_ledger(store.as_ref(), &config.seed)
        .await
        .context("Failed to seed ledger")?;
    let service = SettlementService::new(store);

    let mut rejected = 0usize;
    for call in &calls {
        println!(
            "> {} {} {} {}",
            call.account_id,
            call.role,
            call.operation,
            call.args.join(" ")
        );

        match replay_call(&service, call).await {
            Ok(payload) => println!("{}", String::from_utf8_lossy(&payload)),
            Err(e) => {
                rejected += 1;
                println!("[error:{}] {}", e.kind(), e);
                if fail_fast {
                    anyhow::bail!("line {}: {}", call.line, e);
                }
            }
        }
    }

    println!();
    println!(
        "{} calls, {} succeeded, {} rejected",
        calls.len(),
        calls.len() - rejected,
        rejected
    );
    Ok(())
}

/// Dispatch one script call as its own caller
async fn replay_call(service: &SettlementService, call: &Call) -> settlement::Result<Vec<u8>> {
    let identity = StaticIdentity::new(call.account_id.as_str(), call.role.as_str());
    dispatch(service, &identity, &call.operation, &call.args).await
}

async fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            return Err(e);
        }
    };

    let report = validate_config(&config);

    // Print summary
    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Service: {}", config.service.name);
    println!("Money accounts: {}", config.seed.money_accounts.len());
    println!("Holdings: {}", config.seed.holdings.len());
    println!("Security profiles: {}", config.seed.security_profiles.len());

    Ok(())
}

async fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("This configuration includes:");
    println!("  - {} money accounts", config.seed.money_accounts.len());
    println!("  - {} share holdings", config.seed.holdings.len());
    println!(
        "  - {} security profiles",
        config.seed.security_profiles.len()
    );
    println!();
    println!("Next steps:");
    println!("  1. Edit the seed to match your ledger");
    println!(
        "  2. Run 'setl validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'setl run --config {:?} --script <calls>' to replay a call script",
        output_path
    );

    Ok(())
}

fn operations_command() {
    println!("{:<34} {:<8} {:<16} ARGS", "OPERATION", "KIND", "ROLES");
    for spec in OPERATIONS.iter() {
        let roles: Vec<&str> = spec.roles.iter().map(|r| r.as_str()).collect();
        let args: Vec<String> = spec
            .args
            .iter()
            .enumerate()
            .map(|(i, a)| {
                if i >= spec.args.len() - spec.optional {
                    format!("[{}]", a)
                } else {
                    a.to_string()
                }
            })
            .collect();
        println!(
            "{:<34} {:<8} {:<16} {}",
            spec.name,
            format!("{:?}", spec.kind).to_lowercase(),
            roles.join(","),
            args.join(" ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use config::default_seed;
    use settlement::{MoneyAccount, SettlementError, Transaction, TransactionStatus};

    async fn seeded_service() -> SettlementService {
        let store = Arc::new(InMemoryTableStore::new());
        initialize_ledger(store.as_ref(), &default_seed()).await.unwrap();
        SettlementService::new(store)
    }

    fn call_at(calls: &[Call], operation: &str, args: &[&str]) -> usize {
        calls
            .iter()
            .position(|c| c.operation == operation && c.args == args)
            .unwrap()
    }

    #[tokio::test]
    async fn test_demo_script_settles_against_default_seed() {
        let calls = script::parse_script(include_str!("../../../demos/calls.txt")).unwrap();
        let service = seeded_service().await;

        let mut results = Vec::new();
        for call in &calls {
            results.push(replay_call(&service, call).await);
        }

        let rejected: Vec<_> = calls
            .iter()
            .zip(&results)
            .filter(|(_, r)| r.is_err())
            .map(|(c, _)| c.line)
            .collect();
        assert_eq!(rejected, vec![calls[call_at(&calls, "confirmBuy", &["3"])].line]);
        assert_matches!(
            &results[call_at(&calls, "confirmBuy", &["3"])],
            Err(SettlementError::InvalidBuyer { transaction_id: 3, .. })
        );

        let confirmed: Transaction =
            serde_json::from_slice(results[call_at(&calls, "confirmBuy", &["1"])].as_ref().unwrap())
                .unwrap();
        assert_eq!(confirmed.status, TransactionStatus::Confirmed);

        let cancelled: Transaction =
            serde_json::from_slice(results[call_at(&calls, "cancel", &["2"])].as_ref().unwrap())
                .unwrap();
        assert_eq!(cancelled.status, TransactionStatus::CancelledBySeller);

        let seller_query = calls
            .iter()
            .position(|c| c.account_id == "AA01" && c.operation == "getMoney")
            .unwrap();
        let seller_money: Vec<MoneyAccount> =
            serde_json::from_slice(results[seller_query].as_ref().unwrap()).unwrap();
        assert_eq!(seller_money[0].amount, 100_000 + 12 * 100);
    }

    #[tokio::test]
    async fn test_replay_call_uses_script_identity() {
        let service = seeded_service().await;
        let calls = script::parse_script("A01 bot getMoney\nA01 trader getMoney\n").unwrap();

        assert_matches!(
            replay_call(&service, &calls[0]).await,
            Err(SettlementError::InvalidRole { .. })
        );
        let money: Vec<MoneyAccount> =
            serde_json::from_slice(&replay_call(&service, &calls[1]).await.unwrap()).unwrap();
        assert_eq!(money[0].account_id, "A01");
        assert_eq!(money[0].amount, 100_000);
    }
}
