//! Command handlers for CLI operations
//!
//! This module implements the handlers behind each CLI command:
//! - version: Print build information
//! - list: List registered coins
//! - info/download/bootstrap/configure/getinfo: Dispatch to the coin plugin
//! - monitor: Run the polling supervisor until interrupted

use anyhow::{Context, Result};
use sdk::{ArtifactHandle, CoinCommand, CommandArgs, MnError, PathOverrides};
use std::sync::Arc;

use crate::config::Config;
use crate::registry::{CoinRegistry, DispatchOutcome};
use crate::supervisor::{self, MonitorOptions, Supervisor};
use mnkeeper_fetch::{stderr_progress, ArtifactFetcher};

/// Build the registry with every coin shipped in this binary
pub async fn builtin_registry(config: &Config) -> Result<Arc<CoinRegistry>> {
    let fetcher = ArtifactFetcher::new(&config.network.user_agent, config.download_timeout())?
        .with_progress(stderr_progress());

    let registry = CoinRegistry::new(
        ArtifactHandle::new(Arc::new(fetcher)),
        config.rpc_timeout(),
    );
    registry
        .register(pivx::plugin())
        .await
        .context("Failed to register built-in coins")?;

    Ok(Arc::new(registry))
}

/// Print version and build information
pub fn handle_version() {
    println!(
        "mnkeeper v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );
}

/// List registered coins
pub async fn handle_list(registry: &CoinRegistry) {
    let coins = registry.list().await;
    if coins.is_empty() {
        println!("No coins registered!");
        return;
    }

    println!("Registered coins:");
    for (i, coin) in coins.iter().enumerate() {
        println!("{}. {}", i + 1, coin);
    }
}

/// The coin named by `--coin`, normalized to the registry's lowercase keys
pub fn selected_coin(coin: Option<&str>) -> Result<String, MnError> {
    match coin.map(|c| c.trim().to_ascii_lowercase()) {
        Some(c) if !c.is_empty() => Ok(c),
        _ => Err(MnError::InvalidArgument(
            "no coin selected, pass --coin (see 'mnkeeper list')".to_string(),
        )),
    }
}

/// Run one per-coin command through the registry
pub async fn handle_coin_command(
    registry: &CoinRegistry,
    coin: &str,
    command: CoinCommand,
    overrides: &PathOverrides,
    args: &CommandArgs,
) -> Result<()> {
    tracing::info!("{} {}", coin, command);

    match registry
        .dispatch_command(coin, command, overrides, args)
        .await?
    {
        DispatchOutcome::DaemonInfo(info) => {
            if info.starting_up {
                println!("{} daemon is starting up", coin);
            }
            if !info.details.is_null() {
                println!("{}", serde_json::to_string_pretty(&info.details)?);
            }
        }
        DispatchOutcome::Skipped => println!("Nothing to do for {} {}", coin, command),
        DispatchOutcome::Completed => {}
    }
    Ok(())
}

/// Poll the coin's daemon until Ctrl-C / SIGTERM
pub async fn handle_monitor(
    registry: Arc<CoinRegistry>,
    coin: &str,
    overrides: PathOverrides,
    options: MonitorOptions,
) -> Result<()> {
    // Unknown coins fail here rather than as a failed first poll
    registry.lookup(coin).await?;

    println!(
        "Monitoring {} every {:?} (Ctrl-C to stop)",
        coin, options.interval
    );

    let (shutdown_tx, shutdown_rx) = supervisor::shutdown_channel();
    let signals = supervisor::spawn_signal_handler(shutdown_tx);

    let mut supervisor = Supervisor::new(registry, coin, overrides, options);
    let result = supervisor.run(shutdown_rx).await;
    signals.abort();

    let report = result?;
    println!(
        "Stopped after {} heartbeat(s), {} failed poll(s)",
        report.heartbeats, report.failures
    );
    Ok(())
}
