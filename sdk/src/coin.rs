//! Coin plugin trait and context types
//!
//! This module defines the `CoinPlugin` trait that every supported coin
//! implements, and the `CoinContext` through which a hook reaches the rest of
//! the system. Plugins never talk to the registry, the HTTP stack or the
//! archive code directly; they go through the handles on the context.

use crate::conf::ConfMap;
use crate::errors::MnError;
use crate::types::{
    BootstrapArtifact, BootstrapOverrides, CoinCommand, CoinDescriptor, ConfigureArgs, DaemonInfo,
    DownloadOverrides, HookState, ResolvedPaths, WalletArtifact,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Trait that all coin plugins must implement
#[async_trait]
pub trait CoinPlugin: Send + Sync {
    /// Static metadata for the coin
    fn descriptor(&self) -> &CoinDescriptor;

    /// How the plugin backs `command`
    ///
    /// The registry refuses plugins reporting any command as `Missing`, and
    /// skips `NoOp` hooks with a notice instead of calling them.
    fn hook_state(&self, _command: CoinCommand) -> HookState {
        HookState::Implemented
    }

    /// Print information about the coin's installation
    async fn info(&self, ctx: &CoinContext) -> Result<(), MnError>;

    /// Fetch and unpack the wallet binaries
    async fn download(&self, ctx: &CoinContext, overrides: &DownloadOverrides)
        -> Result<(), MnError>;

    /// Fetch and unpack the blockchain bootstrap snapshot
    async fn bootstrap(
        &self,
        ctx: &CoinContext,
        overrides: &BootstrapOverrides,
    ) -> Result<(), MnError>;

    /// Generate the daemon's config file for masternode duty
    async fn configure(&self, ctx: &CoinContext, args: &ConfigureArgs) -> Result<(), MnError>;

    /// Query the running daemon
    async fn getinfo(&self, ctx: &CoinContext) -> Result<DaemonInfo, MnError>;
}

/// Context handed to every hook invocation.
///
/// Built fresh by the registry on each dispatch, so `paths` and `config`
/// always reflect the filesystem at the time the command started.
#[derive(Clone)]
pub struct CoinContext {
    /// Coin metadata
    pub descriptor: CoinDescriptor,

    /// Effective paths with existence flags
    pub paths: ResolvedPaths,

    /// Parsed coin config file (empty when absent)
    pub config: ConfMap,

    /// Handle for daemon RPC calls
    pub rpc: RpcHandle,

    /// Handle for downloading and installing artifacts
    pub artifacts: ArtifactHandle,
}

impl CoinContext {
    /// Create a new CoinContext
    pub fn new(
        descriptor: CoinDescriptor,
        paths: ResolvedPaths,
        config: ConfMap,
        rpc: RpcHandle,
        artifacts: ArtifactHandle,
    ) -> Self {
        Self {
            descriptor,
            paths,
            config,
            rpc,
            artifacts,
        }
    }
}

/// JSON request body sent to a coin daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcRequest {
    pub method: String,
    pub id: u64,
    pub params: Vec<serde_json::Value>,
}

/// Error object embedded in a daemon response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Daemon response envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Handle for RPC calls against the coin's daemon
#[derive(Clone)]
pub struct RpcHandle {
    inner: Arc<dyn RpcHandleImpl>,
}

impl RpcHandle {
    /// Create a new RpcHandle with the given implementation
    pub fn new(inner: Arc<dyn RpcHandleImpl>) -> Self {
        Self { inner }
    }

    /// Issue one JSON request
    ///
    /// Transport problems come back as errors; an error object inside a
    /// well-formed response does not, and is left to the caller to interpret.
    pub async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<RpcResponse, MnError> {
        self.inner.call(method, params).await
    }
}

/// Trait for RPC handle implementation (to be implemented by engine)
#[async_trait]
pub trait RpcHandleImpl: Send + Sync {
    async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<RpcResponse, MnError>;
}

/// Handle for artifact acquisition
#[derive(Clone)]
pub struct ArtifactHandle {
    inner: Arc<dyn ArtifactHandleImpl>,
}

impl ArtifactHandle {
    /// Create a new ArtifactHandle with the given implementation
    pub fn new(inner: Arc<dyn ArtifactHandleImpl>) -> Self {
        Self { inner }
    }

    /// Download, verify and unpack a wallet bundle into the wallet root
    pub async fn install_wallet(
        &self,
        artifact: &WalletArtifact,
        paths: &ResolvedPaths,
    ) -> Result<PathBuf, MnError> {
        self.inner.install_wallet(artifact, paths).await
    }

    /// Download and unpack a bootstrap snapshot into the data directory
    pub async fn install_bootstrap(
        &self,
        artifact: &BootstrapArtifact,
        paths: &ResolvedPaths,
    ) -> Result<PathBuf, MnError> {
        self.inner.install_bootstrap(artifact, paths).await
    }
}

/// Trait for artifact handle implementation (to be implemented by the fetcher)
#[async_trait]
pub trait ArtifactHandleImpl: Send + Sync {
    async fn install_wallet(
        &self,
        artifact: &WalletArtifact,
        paths: &ResolvedPaths,
    ) -> Result<PathBuf, MnError>;

    async fn install_bootstrap(
        &self,
        artifact: &BootstrapArtifact,
        paths: &ResolvedPaths,
    ) -> Result<PathBuf, MnError>;
}
