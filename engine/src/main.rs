// mnkeeper
// Main entry point for the mnkeeper binary

use clap::Parser;
use mnkeeper_engine::cli::{Cli, Command};
use mnkeeper_engine::config::{validate_log_level, Config};
use mnkeeper_engine::handlers::{
    builtin_registry, handle_coin_command, handle_list, handle_monitor, handle_version,
    selected_coin,
};
use mnkeeper_engine::supervisor::MonitorOptions;
use mnkeeper_engine::telemetry::init_telemetry_with_level;
use sdk::{
    BootstrapOverrides, CoinCommand, CommandArgs, ConfigureArgs, DownloadOverrides, MnError,
    MnErrorExt, PathOverrides,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {:#}", err);
        if let Some(hint) = err.downcast_ref::<MnError>().map(MnErrorExt::user_hint) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    let log_level = match &cli.log {
        Some(level) => {
            validate_log_level(level)?;
            level.as_str()
        }
        None => config.core.log_level.as_str(),
    };
    init_telemetry_with_level(log_level);

    tracing::debug!(
        "mnkeeper v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    let overrides = PathOverrides {
        wallet: cli.wallet.clone().unwrap_or_default(),
        bins: cli.bins.clone().unwrap_or_default(),
        data: cli.data.clone().unwrap_or_default(),
    };

    let coin = cli.coin.as_deref();
    match cli.command {
        Command::Version => {
            handle_version();
            Ok(())
        }

        Command::List => {
            let registry = builtin_registry(&config).await?;
            handle_list(&registry).await;
            Ok(())
        }

        Command::Monitor { start, refresh } => {
            let coin = selected_coin(coin)?;
            let registry = builtin_registry(&config).await?;
            let options = MonitorOptions {
                start,
                interval: refresh.unwrap_or_else(|| config.refresh_interval()),
            };
            handle_monitor(registry, &coin, overrides, options).await
        }

        Command::Info => {
            dispatch(&config, coin, CoinCommand::Info, CommandArgs::None, &overrides).await
        }

        Command::Download {
            url,
            compression,
            shasum,
        } => {
            let args = CommandArgs::Download(DownloadOverrides {
                url: url.unwrap_or_default(),
                compression: compression.unwrap_or_default(),
                sha256: shasum.unwrap_or_default(),
            });
            dispatch(&config, coin, CoinCommand::Download, args, &overrides).await
        }

        Command::Bootstrap { url, compression } => {
            let args = CommandArgs::Bootstrap(BootstrapOverrides {
                url: url.unwrap_or_default(),
                compression: compression.unwrap_or_default(),
            });
            dispatch(&config, coin, CoinCommand::Bootstrap, args, &overrides).await
        }

        Command::Configure { ip, mnpkey } => {
            let args = CommandArgs::Configure(ConfigureArgs {
                ip,
                masternode_key: mnpkey,
            });
            dispatch(&config, coin, CoinCommand::Configure, args, &overrides).await
        }

        Command::Getinfo => {
            dispatch(&config, coin, CoinCommand::GetInfo, CommandArgs::None, &overrides).await
        }
    }
}

async fn dispatch(
    config: &Config,
    coin: Option<&str>,
    command: CoinCommand,
    args: CommandArgs,
    overrides: &PathOverrides,
) -> anyhow::Result<()> {
    let coin = selected_coin(coin)?;
    let registry = builtin_registry(config).await?;
    handle_coin_command(&registry, &coin, command, overrides, &args).await
}
