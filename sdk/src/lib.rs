//! mnkeeper SDK
//!
//! Shared library providing the coin plugin trait, coin metadata types, the
//! error taxonomy and the coin config file format. This crate is used by the
//! engine, the artifact fetcher and every coin plugin.

/// Coin plugin trait and context handles
pub mod coin;

/// Coin config file read/write
pub mod conf;

/// Error types and handling
pub mod errors;

/// Coin metadata and command option types
pub mod types;

// Re-export commonly used types
pub use coin::{
    ArtifactHandle, ArtifactHandleImpl, CoinContext, CoinPlugin, RpcErrorObject, RpcHandle,
    RpcHandleImpl, RpcRequest, RpcResponse,
};
pub use conf::ConfMap;
pub use errors::{MnError, MnErrorExt};
pub use types::{
    BootstrapArtifact, BootstrapOverrides, CoinCommand, CoinDescriptor, CommandArgs,
    CompressionKind, ConfigureArgs, DaemonInfo, DownloadOverrides, HookState, PathEntry,
    PathOverrides, ResolvedPaths, WalletArtifact,
};
