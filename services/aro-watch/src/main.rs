//! aro-watch CLI
//!
//! Command-line interface for the affordable rental availability monitor.

use std::path::PathBuf;
use std::sync::Arc;

use aro_watch::logging::init_tracing;
use aro_watch::state::{FileStateStore, MemoryStateStore};
use aro_watch::status::StatusReport;
use aro_watch::{load_config, Config, WatcherBuilder};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::Level;

#[derive(Parser)]
#[command(name = "aro-watch")]
#[command(about = "Affordable rental availability monitor")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single check
    Check {
        /// Fetch and parse only; no state changes, no notifications
        #[arg(long)]
        dry_run: bool,
    },
    /// Check on the configured schedule until interrupted (default)
    Run,
    /// Show configuration and the last recorded result
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn resolve_config(path: Option<&PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(config_path) => load_config(config_path)?,
        None => Config::default(),
    };

    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // the log file location comes from the config, so logging starts after it loads
    let config = resolve_config(args.config.as_ref())?;
    init_tracing(args.log_level, config.logging.file.as_deref())?;

    tracing::debug!(
        "Parsed command line arguments: config={:?}, log_level={:?}, log_file={:?}",
        args.config,
        args.log_level,
        config.logging.file
    );

    match args.command.unwrap_or(Command::Run) {
        Command::Status { json } => {
            let store = FileStateStore::new(&config.state.path);
            let report = StatusReport::gather(&config, &store)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
        Command::Check { dry_run: true } => {
            let watcher = WatcherBuilder::new(config)
                .with_notifiers(Vec::new())
                .with_state_store(Arc::new(MemoryStateStore::default()))
                .build()?;
            let result = watcher.probe().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Check { dry_run: false } => {
            let mut watcher = WatcherBuilder::new(config).build()?;
            let outcome = watcher.check().await;
            if outcome.is_failure() {
                return Err(outcome.to_string().into());
            }
        }
        Command::Run => {
            let cancel = CancellationToken::new();
            let cancel_for_signal = cancel.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for ctrl-c: {}", e);
                    return;
                }
                tracing::info!("Shutdown signal received");
                cancel_for_signal.cancel();
            });

            tracing::info!("Starting aro-watch");
            WatcherBuilder::new(config)
                .with_cancellation_token(cancel)
                .build()?
                .start()
                .await?;
        }
    }

    Ok(())
}
