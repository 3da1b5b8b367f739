use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setl")]
#[command(about = "Securities settlement ledger")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a call script against a freshly seeded in-memory ledger
    Run {
        /// Path to the configuration file
        #[arg(short, long, default_value = "setl.yaml", env = "SETL_CONFIG")]
        config: PathBuf,

        /// Call script: one `<accountID> <role> <operation> [args...]` per line
        #[arg(short, long)]
        script: PathBuf,

        /// Stop at the first rejected call
        #[arg(long)]
        fail_fast: bool,
    },

    /// Validate configuration without running anything
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "setl.yaml", env = "SETL_CONFIG")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with the default seed
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "setl.yaml")]
        output: PathBuf,
    },

    /// List the ledger operations with their arguments and roles
    Operations,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from(["setl", "run", "--script", "calls.txt", "--fail-fast"]);
        match cli.command {
            Commands::Run {
                config,
                script,
                fail_fast,
            } => {
                assert_eq!(config, PathBuf::from("setl.yaml"));
                assert_eq!(script, PathBuf::from("calls.txt"));
                assert!(fail_fast);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_script() {
        assert!(Cli::try_parse_from(["setl", "run"]).is_err());
    }

    #[test]
    fn test_clap_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
