//! CLI interface for mnkeeper
//!
//! This module provides the command-line interface using clap's derive API.
//! Global flags select the coin and override its paths; each subcommand maps
//! to a registry dispatch or to one of the tool-level commands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Masternode keeper
///
/// Fetches and verifies a coin's wallet, seeds its blockchain, writes its
/// masternode configuration and keeps an eye on the running daemon.
#[derive(Parser, Debug)]
#[command(name = "mnkeeper")]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Coin to operate on (see `mnkeeper list`)
    #[arg(long, global = true, value_name = "COIN")]
    pub coin: Option<String>,

    /// Base path the wallet is extracted into (coin default if omitted)
    #[arg(long, global = true, value_name = "PATH")]
    pub wallet: Option<String>,

    /// Sub-path of the wallet holding the binaries (coin default if omitted)
    #[arg(long, global = true, value_name = "PATH")]
    pub bins: Option<String>,

    /// Blockchain data path (coin default if omitted)
    #[arg(long, global = true, value_name = "PATH")]
    pub data: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Print version and build information
    Version,

    /// List the coins mnkeeper knows about
    List,

    /// Show the coin's resolved paths and whether they exist
    Info,

    /// Fetch the coin's wallet binaries into the wallet path
    Download {
        /// Fetch from this URL instead of the coin default
        #[arg(long)]
        url: Option<String>,

        /// Compression of the download (none, tar.gz, zip)
        #[arg(long = "type", value_name = "TYPE")]
        compression: Option<String>,

        /// Expected SHA-256 of the download
        #[arg(long)]
        shasum: Option<String>,
    },

    /// Fetch the blockchain bootstrap snapshot into the data path
    Bootstrap {
        /// Fetch from this URL instead of the coin default
        #[arg(long)]
        url: Option<String>,

        /// Compression of the download (none, tar.gz, zip)
        #[arg(long = "type", value_name = "TYPE")]
        compression: Option<String>,
    },

    /// Write the coin's config file for masternode duty
    Configure {
        /// Fixed external IP of this masternode
        #[arg(long)]
        ip: String,

        /// Masternode private key
        #[arg(long)]
        mnpkey: String,
    },

    /// Query the running daemon
    Getinfo,

    /// Poll the daemon until interrupted
    Monitor {
        /// Start the daemon if it is not running
        #[arg(long)]
        start: bool,

        /// Poll interval, e.g. 30s, 5m, 1h (config default if omitted)
        #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
        refresh: Option<Duration>,
    },
}

/// Parse `<number><unit>` with unit one of ms, s, m, h; a bare number is
/// seconds
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{}'", raw))?;

    let duration = match unit {
        "" | "s" => Duration::from_secs(value),
        "ms" => Duration::from_millis(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        "h" => Duration::from_secs(value.saturating_mul(3600)),
        other => return Err(format!("unknown duration unit '{}'", other)),
    };

    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["mnkeeper", "list"]);
        assert_eq!(cli.command, Command::List);
        assert!(cli.coin.is_none());
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags_after_command() {
        let cli = Cli::parse_from([
            "mnkeeper", "info", "--coin", "pivx", "--data", "/srv/pivx", "--log", "debug",
        ]);
        assert_eq!(cli.command, Command::Info);
        assert_eq!(cli.coin.as_deref(), Some("pivx"));
        assert_eq!(cli.data.as_deref(), Some("/srv/pivx"));
        assert_eq!(cli.log.as_deref(), Some("debug"));
    }

    #[test]
    fn test_download_overrides() {
        let cli = Cli::parse_from([
            "mnkeeper",
            "--coin",
            "pivx",
            "download",
            "--url",
            "https://example.org/w.zip",
            "--type",
            "zip",
            "--shasum",
            "abcd",
        ]);
        assert_eq!(
            cli.command,
            Command::Download {
                url: Some("https://example.org/w.zip".to_string()),
                compression: Some("zip".to_string()),
                shasum: Some("abcd".to_string()),
            }
        );
    }

    #[test]
    fn test_configure_requires_both_args() {
        assert!(Cli::try_parse_from(["mnkeeper", "configure", "--ip", "1.2.3.4"]).is_err());

        let cli = Cli::parse_from([
            "mnkeeper", "configure", "--ip", "1.2.3.4", "--mnpkey", "KEY",
        ]);
        assert_eq!(
            cli.command,
            Command::Configure {
                ip: "1.2.3.4".to_string(),
                mnpkey: "KEY".to_string(),
            }
        );
    }

    #[test]
    fn test_monitor_refresh() {
        let cli = Cli::parse_from(["mnkeeper", "monitor", "--start", "--refresh", "5m"]);
        assert_eq!(
            cli.command,
            Command::Monitor {
                start: true,
                refresh: Some(Duration::from_secs(300)),
            }
        );
        assert!(Cli::try_parse_from(["mnkeeper", "monitor", "--refresh", "soon"]).is_err());
    }

    #[test]
    fn test_no_args_is_help() {
        assert!(Cli::try_parse_from(["mnkeeper"]).is_err());
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("3d").is_err());
        assert!(parse_duration("").is_err());
    }
}
