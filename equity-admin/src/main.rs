//! equity-admin: command-line bookkeeping for the employee stock pool
//!
//! Each invocation loads the saved state, runs one command and saves the
//! state again when the command changed it.

mod cli;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};

use equity_ledger::{EquityAdmin, EquityConfig, JsonFileStore, SnapshotStore, StoreError};

#[derive(Parser)]
#[command(name = "equity-admin")]
#[command(about = "Stock pool, grant and employee lifecycle administration")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "equity-admin.toml")]
    config: String,

    /// State file (overrides config file)
    #[arg(short, long, env = "EQUITY_STATE_PATH")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: cli::Commands,
}

fn load_config(path: &str) -> anyhow::Result<Option<EquityConfig>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Build the ledger from the saved state, or a fresh one when there is none.
///
/// An unreadable state file is fatal unless `replacing` is set, in which
/// case the command is about to overwrite the whole state.
async fn load_state(
    store: &JsonFileStore,
    config: &EquityConfig,
    replacing: bool,
) -> anyhow::Result<EquityAdmin> {
    let mut admin = EquityAdmin::new(config)?;
    let loaded = match store.load().await {
        Ok(Some(snapshot)) => admin.import_snapshot(snapshot).map_err(StoreError::from),
        Ok(None) => {
            info!(
                path = %store.path().display(),
                total_capacity = config.pool.total_capacity,
                "No saved state, starting a fresh ledger"
            );
            return Ok(admin);
        }
        Err(e) => Err(e),
    };

    match loaded {
        Ok(()) => info!(path = %store.path().display(), "Loaded state"),
        Err(e) if replacing => warn!(
            path = %store.path().display(),
            error = %e,
            "Ignoring unreadable state, the import replaces it"
        ),
        Err(e) => anyhow::bail!("cannot load {}: {e}", store.path().display()),
    }
    Ok(admin)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = load_config(&cli.config)?;
    let found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();

    let level = config.general.log_level.clone();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("equity_admin={level}").parse()?)
                .add_directive(format!("equity_ledger={level}").parse()?),
        )
        .init();

    if found {
        info!(path = %cli.config, "Loaded config");
    } else {
        info!(path = %cli.config, "Config file not found, using defaults");
    }

    if let Some(state) = cli.state {
        config.storage.state_path = state;
    }

    let store = JsonFileStore::new(&config.storage.state_path);
    let replacing = matches!(cli.command, cli::Commands::Import { .. });
    let mut admin = match load_state(&store, &config, replacing).await {
        Ok(admin) => admin,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match cli::execute_command(&mut admin, cli.command).await {
        Ok(output) => {
            if output.mutated {
                store.save(&admin.export_snapshot()).await?;
                info!(path = %store.path().display(), "Saved state");
            }
            println!("{}", output.text);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_config(path.to_str().unwrap()).unwrap().is_none());
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equity-admin.toml");
        std::fs::write(
            &path,
            "[pool]\ntotal_capacity = 2000000\n\n[levels]\nP5 = 10000\n",
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap().unwrap();
        assert_eq!(config.pool.total_capacity, 2_000_000);
        assert_eq!(config.levels.get("P5"), Some(&10_000));
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_cli_state_override() {
        let cli = Cli::try_parse_from([
            "equity-admin",
            "--state",
            "/tmp/ledger.json",
            "ledger",
            "--count",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.state, Some(PathBuf::from("/tmp/ledger.json")));
        assert!(matches!(cli.command, cli::Commands::Ledger { count: 5 }));
    }

    #[tokio::test]
    async fn test_corrupt_state_only_tolerated_for_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{\"employees\": [").unwrap();
        let store = JsonFileStore::new(&path);
        let config = EquityConfig::default();

        let err = load_state(&store, &config, false).await.unwrap_err();
        assert!(err.to_string().starts_with("cannot load"));

        let admin = load_state(&store, &config, true).await.unwrap();
        assert!(admin.employees().is_empty());
        assert_eq!(admin.pool().balance(), 5_000_000);
    }

    #[tokio::test]
    async fn test_load_state_restores_saved_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let config = EquityConfig::default();

        let fresh = load_state(&store, &config, false).await.unwrap();
        assert!(fresh.employees().is_empty());

        let mut admin = EquityAdmin::new(&config).unwrap();
        admin
            .add_employee("Alice", "Engineering", "P7", equity_ledger::EmployeeStatus::Active)
            .unwrap();
        store.save(&admin.export_snapshot()).await.unwrap();

        let loaded = load_state(&store, &config, false).await.unwrap();
        assert_eq!(loaded, admin);
    }
}
