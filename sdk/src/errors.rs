//! Error types and handling
//!
//! This module provides the error type shared by the registry, the artifact
//! pipeline, the RPC transport and the supervisor. Every error implements
//! `MnErrorExt`, which gives the CLI a short operator-facing hint and tells
//! the supervisor whether retrying on the next tick makes sense.

use std::path::PathBuf;
use thiserror::Error;

/// Trait for mnkeeper error extensions
///
/// Provides additional context for errors: a hint the CLI prints under the
/// error message, and whether the failure is transient.
pub trait MnErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors are expected to clear up on their own (a daemon
    /// still booting, a busy RPC server). Non-recoverable errors need the
    /// operator to change something before re-running the command.
    fn is_recoverable(&self) -> bool;
}

/// Main error type
///
/// # Error Categories
///
/// - **Registry**: coin registration and command lookup
/// - **Acquisition**: download, checksum verification and extraction
/// - **RPC**: transport-level failures talking to the coin daemon
/// - **Supervisor**: daemon reachability and launch
///
/// # Examples
///
/// ```
/// use sdk::errors::{MnError, MnErrorExt};
///
/// let error = MnError::UnknownCoin("dogecash".to_string());
/// assert_eq!(error.to_string(), "Unknown coin: dogecash");
/// assert!(!error.user_hint().is_empty());
///
/// let transient = MnError::TransportUnavailable("connection refused".to_string());
/// assert!(transient.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum MnError {
    // Registry errors
    #[error("Coin already registered: {0}")]
    DuplicateCoin(String),

    #[error("Coin {coin} does not implement required commands: {}", missing.join(", "))]
    IncompleteHooks { coin: String, missing: Vec<String> },

    #[error("Unknown coin: {0}")]
    UnknownCoin(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    // Acquisition errors
    #[error("Already installed at {0:?}")]
    AlreadyInstalled(PathBuf),

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Unsupported compression type: {0}")]
    UnsupportedCompression(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    // RPC errors
    #[error("RPC transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("RPC authorization failed")]
    AuthorizationFailed,

    #[error("No response from RPC server: {0}")]
    NoResponse(String),

    #[error("RPC error ({code}): {message}")]
    Rpc { code: i64, message: String },

    // Supervisor errors
    #[error("{0} daemon is not running")]
    DaemonNotRunning(String),

    #[error("Failed to start daemon {path:?}: {reason}")]
    DaemonStartFailed { path: PathBuf, reason: String },

    // Ambient errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MnErrorExt for MnError {
    fn user_hint(&self) -> &str {
        match self {
            // Registry errors
            Self::DuplicateCoin(_) => "Each coin plugin may only be registered once",
            Self::IncompleteHooks { .. } => "The coin plugin is incomplete and cannot be used",
            Self::UnknownCoin(_) => "Run 'mnkeeper list' to see supported coins",
            Self::UnknownCommand(_) => "Run 'mnkeeper help' to see available commands",

            // Acquisition errors
            Self::AlreadyInstalled(_) => "Remove the existing files first to re-install",
            Self::FetchFailed { .. } => "Download failed. Check the URL and your connection",
            Self::ChecksumMismatch { .. } => "Download may be corrupted or tampered with",
            Self::UnsupportedCompression(_) => "Use one of: none, tar.gz, zip",
            Self::ExtractionFailed(_) => "The archive could not be unpacked",

            // RPC errors
            Self::TransportUnavailable(_) => "Is the coin daemon running?",
            Self::AuthorizationFailed => "Check rpcuser/rpcpassword in the coin's .conf file",
            Self::NoResponse(_) => "The daemon answered with an empty or invalid body",
            Self::Rpc { .. } => "The daemon rejected the request",

            // Supervisor errors
            Self::DaemonNotRunning(_) => "Start the daemon, or pass --start to monitor",
            Self::DaemonStartFailed { .. } => "Run 'mnkeeper download' to install the daemon",

            // Ambient errors
            Self::Config(_) => "Check your config.toml file for errors",
            Self::InvalidArgument(_) => "Check the command options",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TransportUnavailable(_)
                | Self::NoResponse(_)
                | Self::Rpc { .. }
                | Self::FetchFailed { .. }
        )
    }
}
