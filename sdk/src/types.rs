//! Coin metadata, artifact specs and per-command option types

use crate::errors::MnError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Compression applied to a downloadable artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionKind {
    /// Used as-is, no extraction step
    None,
    /// gzip-compressed tar stream
    TarGzip,
    /// zip archive
    Zip,
}

impl FromStr for CompressionKind {
    type Err = MnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "tar.gz" | "tgz" | "tar-gzip" => Ok(Self::TarGzip),
            "zip" => Ok(Self::Zip),
            other => Err(MnError::UnsupportedCompression(other.to_string())),
        }
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::TarGzip => write!(f, "tar.gz"),
            Self::Zip => write!(f, "zip"),
        }
    }
}

/// Wallet binary bundle published for a coin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletArtifact {
    /// Wallet release version
    pub version: String,
    /// Download URL
    pub url: String,
    /// Compression of the download
    pub compression: CompressionKind,
    /// Expected SHA-256 of the download (hex), empty to skip verification
    pub sha256: String,
}

impl WalletArtifact {
    /// Apply `download` command overrides to the coin's defaults
    ///
    /// A new URL without a new checksum clears the expected hash, since the
    /// published checksum belongs to the default URL.
    pub fn with_overrides(&self, overrides: &DownloadOverrides) -> Result<Self, MnError> {
        let mut artifact = self.clone();
        if let Some(url) = non_empty(&overrides.url) {
            artifact.url = url.to_string();
            artifact.sha256.clear();
        }
        if let Some(kind) = non_empty(&overrides.compression) {
            artifact.compression = kind.parse()?;
        }
        if let Some(sha) = non_empty(&overrides.sha256) {
            artifact.sha256 = sha.to_string();
        }
        Ok(artifact)
    }
}

/// Blockchain bootstrap snapshot published for a coin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapArtifact {
    /// Download URL, empty when the coin publishes no snapshot
    pub url: String,
    /// Compression of the download
    pub compression: CompressionKind,
}

impl BootstrapArtifact {
    /// Apply `bootstrap` command overrides to the coin's defaults
    pub fn with_overrides(&self, overrides: &BootstrapOverrides) -> Result<Self, MnError> {
        let mut artifact = self.clone();
        if let Some(url) = non_empty(&overrides.url) {
            artifact.url = url.to_string();
        }
        if let Some(kind) = non_empty(&overrides.compression) {
            artifact.compression = kind.parse()?;
        }
        Ok(artifact)
    }
}

/// Static description of a coin, immutable once registered
#[derive(Debug, Clone)]
pub struct CoinDescriptor {
    /// Unique registry key, lowercase
    pub name: String,
    /// Peer-to-peer port
    pub port: u16,
    /// Default RPC port
    pub rpc_port: u16,
    /// Daemon executable name
    pub daemon_bin: String,
    /// Status / CLI executable name
    pub status_bin: String,
    /// Config file name inside the data directory
    pub config_file: String,
    /// Default wallet root (supports ~ expansion)
    pub default_wallet_path: String,
    /// Binary directory relative to the wallet root
    pub default_bin_subpath: String,
    /// Default data directory (supports ~ expansion)
    pub default_data_path: String,
    /// Wallet bundle
    pub wallet: WalletArtifact,
    /// Bootstrap snapshot
    pub bootstrap: BootstrapArtifact,
}

/// User-supplied path overrides; empty strings mean "use the coin default"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOverrides {
    pub wallet: String,
    pub bins: String,
    pub data: String,
}

/// A resolved path together with the existence probe taken at resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathEntry {
    pub path: PathBuf,
    pub exists: bool,
}

impl PathEntry {
    pub fn new(path: PathBuf, exists: bool) -> Self {
        Self { path, exists }
    }
}

/// Effective paths for a coin, recomputed on every dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub wallet_root: PathEntry,
    pub bin_dir: PathEntry,
    pub daemon_bin: PathEntry,
    pub status_bin: PathEntry,
    pub data_dir: PathEntry,
    pub config_file: PathEntry,
}

impl ResolvedPaths {
    /// True when every wallet path and both binaries are present
    pub fn wallet_installed(&self) -> bool {
        self.wallet_root.exists
            && self.bin_dir.exists
            && self.daemon_bin.exists
            && self.status_bin.exists
    }
}

impl fmt::Display for ResolvedPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("Base directory:    ", &self.wallet_root),
            ("Binary directory:  ", &self.bin_dir),
            ("Coin daemon binary:", &self.daemon_bin),
            ("Coin status binary:", &self.status_bin),
            ("Data directory:    ", &self.data_dir),
            ("Config file:       ", &self.config_file),
        ];
        for (label, entry) in rows {
            let state = if entry.exists { "     OK" } else { "MISSING" };
            writeln!(f, "  * {} [ {} ] {}", label, state, entry.path.display())?;
        }
        Ok(())
    }
}

/// Overrides accepted by the `download` command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOverrides {
    pub url: String,
    pub compression: String,
    pub sha256: String,
}

/// Overrides accepted by the `bootstrap` command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapOverrides {
    pub url: String,
    pub compression: String,
}

/// Arguments required by the `configure` command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureArgs {
    /// Masternode's fixed external IP
    pub ip: String,
    /// Masternode private key
    pub masternode_key: String,
}

/// Command-specific arguments passed through dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommandArgs {
    #[default]
    None,
    Download(DownloadOverrides),
    Bootstrap(BootstrapOverrides),
    Configure(ConfigureArgs),
}

/// The five per-coin commands every plugin provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoinCommand {
    Info,
    Download,
    Bootstrap,
    Configure,
    GetInfo,
}

impl CoinCommand {
    /// All hook-backed commands, in registration check order
    pub const ALL: [CoinCommand; 5] = [
        CoinCommand::Info,
        CoinCommand::Download,
        CoinCommand::Bootstrap,
        CoinCommand::Configure,
        CoinCommand::GetInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Download => "download",
            Self::Bootstrap => "bootstrap",
            Self::Configure => "configure",
            Self::GetInfo => "getinfo",
        }
    }
}

impl FromStr for CoinCommand {
    type Err = MnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "download" => Ok(Self::Download),
            "bootstrap" => Ok(Self::Bootstrap),
            "configure" => Ok(Self::Configure),
            "getinfo" => Ok(Self::GetInfo),
            other => Err(MnError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for CoinCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a plugin backs one of its commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    /// The hook does real work
    Implemented,
    /// The hook exists but intentionally does nothing for this coin
    NoOp,
    /// The plugin cannot serve this command
    Missing,
}

/// Outcome of a successful `getinfo` hook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaemonInfo {
    /// The daemon answered but is still loading (block index, wallet...)
    pub starting_up: bool,
    /// Raw `result` object returned by the daemon
    pub details: serde_json::Value,
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletArtifact {
        WalletArtifact {
            version: "1.0.0".to_string(),
            url: "https://example.org/wallet.tar.gz".to_string(),
            compression: CompressionKind::TarGzip,
            sha256: "abcd".to_string(),
        }
    }

    #[test]
    fn test_compression_kind_parsing() {
        assert_eq!("tar.gz".parse::<CompressionKind>().unwrap(), CompressionKind::TarGzip);
        assert_eq!("ZIP".parse::<CompressionKind>().unwrap(), CompressionKind::Zip);
        assert_eq!("".parse::<CompressionKind>().unwrap(), CompressionKind::None);
        assert!(matches!(
            "rar".parse::<CompressionKind>(),
            Err(MnError::UnsupportedCompression(kind)) if kind == "rar"
        ));
    }

    #[test]
    fn test_wallet_overrides_empty_keeps_defaults() {
        let artifact = wallet().with_overrides(&DownloadOverrides::default()).unwrap();
        assert_eq!(artifact, wallet());
    }

    #[test]
    fn test_wallet_url_override_clears_checksum() {
        let overrides = DownloadOverrides {
            url: "https://mirror.example.org/w.zip".to_string(),
            compression: "zip".to_string(),
            sha256: String::new(),
        };
        let artifact = wallet().with_overrides(&overrides).unwrap();
        assert_eq!(artifact.url, "https://mirror.example.org/w.zip");
        assert_eq!(artifact.compression, CompressionKind::Zip);
        assert!(artifact.sha256.is_empty());
    }

    #[test]
    fn test_bootstrap_override_rejects_unknown_type() {
        let bootstrap = BootstrapArtifact {
            url: String::new(),
            compression: CompressionKind::Zip,
        };
        let overrides = BootstrapOverrides {
            url: String::new(),
            compression: "7z".to_string(),
        };
        assert!(bootstrap.with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_coin_command_round_trip() {
        for command in CoinCommand::ALL {
            assert_eq!(command.as_str().parse::<CoinCommand>().unwrap(), command);
        }
        assert!(matches!(
            "monitor".parse::<CoinCommand>(),
            Err(MnError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_paths_report_marks_missing() {
        let mut paths = ResolvedPaths::default();
        paths.data_dir = PathEntry::new(PathBuf::from("/data"), true);
        let report = paths.to_string();
        assert!(report.contains("[      OK ] /data"));
        assert_eq!(report.matches("[ MISSING ]").count(), 5);
    }
}
