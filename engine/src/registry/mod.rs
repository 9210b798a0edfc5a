//! Coin registry and command dispatch
//!
//! The registry maps a coin name to its plugin. It is built once at start-up,
//! shared behind an `Arc`, and is the only way the CLI and the supervisor
//! reach coin-specific behavior.
//!
//! Every dispatch re-resolves the coin's paths and reloads its `.conf` file,
//! so a hook never sees state left over from an earlier command. Dispatches
//! for the same coin are serialized by a per-entry mutex; different coins run
//! independently.

use crate::paths;
use crate::rpc::RpcClient;
use sdk::conf::load_conf_file;
use sdk::{
    ArtifactHandle, CoinCommand, CoinContext, CoinDescriptor, CoinPlugin, CommandArgs, DaemonInfo,
    HookState, MnError, PathOverrides, ResolvedPaths, RpcHandle,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Result of a dispatched command
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The hook ran to completion
    Completed,
    /// The hook is declared a no-op for this coin and was skipped
    Skipped,
    /// `getinfo` reached the daemon
    DaemonInfo(DaemonInfo),
}

struct RegistryEntry {
    plugin: Arc<dyn CoinPlugin>,
    /// Paths from the most recent dispatch; the lock serializes dispatches
    paths: Mutex<ResolvedPaths>,
}

/// Table of registered coins
pub struct CoinRegistry {
    entries: RwLock<HashMap<String, Arc<RegistryEntry>>>,
    artifacts: ArtifactHandle,
    rpc_timeout: Duration,
}

impl CoinRegistry {
    /// Create an empty registry
    ///
    /// `artifacts` is handed to every hook; RPC clients are built per
    /// dispatch from the coin's config file with `rpc_timeout`.
    pub fn new(artifacts: ArtifactHandle, rpc_timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            artifacts,
            rpc_timeout,
        }
    }

    /// Register a coin plugin under its descriptor name
    pub async fn register(&self, plugin: Arc<dyn CoinPlugin>) -> Result<(), MnError> {
        let name = plugin.descriptor().name.clone();

        let missing: Vec<String> = CoinCommand::ALL
            .iter()
            .filter(|command| plugin.hook_state(**command) == HookState::Missing)
            .map(|command| command.as_str().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(MnError::IncompleteHooks {
                coin: name,
                missing,
            });
        }

        let mut entries = self.entries.write().await;
        if entries.contains_key(&name) {
            return Err(MnError::DuplicateCoin(name));
        }

        entries.insert(
            name.clone(),
            Arc::new(RegistryEntry {
                plugin,
                paths: Mutex::new(ResolvedPaths::default()),
            }),
        );
        info!("Registered coin {}", name);
        Ok(())
    }

    /// Descriptor of a registered coin
    pub async fn lookup(&self, name: &str) -> Result<CoinDescriptor, MnError> {
        let entry = self.entry(name).await?;
        Ok(entry.plugin.descriptor().clone())
    }

    /// Registered coin names, sorted
    pub async fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Dispatch a command given by name, as typed on the command line
    pub async fn dispatch(
        &self,
        coin: &str,
        command: &str,
        overrides: &PathOverrides,
        args: &CommandArgs,
    ) -> Result<DispatchOutcome, MnError> {
        let entry = self.entry(coin).await?;
        let command: CoinCommand = command.parse()?;
        self.run(&entry, command, overrides, args).await
    }

    /// Dispatch an already-parsed command
    pub async fn dispatch_command(
        &self,
        coin: &str,
        command: CoinCommand,
        overrides: &PathOverrides,
        args: &CommandArgs,
    ) -> Result<DispatchOutcome, MnError> {
        let entry = self.entry(coin).await?;
        self.run(&entry, command, overrides, args).await
    }

    /// Freshly resolved paths for a coin
    pub async fn resolve_paths(
        &self,
        coin: &str,
        overrides: &PathOverrides,
    ) -> Result<ResolvedPaths, MnError> {
        let entry = self.entry(coin).await?;
        let mut current = entry.paths.lock().await;
        *current = paths::resolve(entry.plugin.descriptor(), overrides)?;
        Ok(current.clone())
    }

    /// Paths as resolved by the most recent dispatch for a coin
    pub async fn last_paths(&self, coin: &str) -> Result<ResolvedPaths, MnError> {
        let entry = self.entry(coin).await?;
        let current = entry.paths.lock().await;
        Ok(current.clone())
    }

    async fn entry(&self, name: &str) -> Result<Arc<RegistryEntry>, MnError> {
        self.entries
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| MnError::UnknownCoin(name.to_string()))
    }

    async fn run(
        &self,
        entry: &RegistryEntry,
        command: CoinCommand,
        overrides: &PathOverrides,
        args: &CommandArgs,
    ) -> Result<DispatchOutcome, MnError> {
        let plugin = &entry.plugin;
        let descriptor = plugin.descriptor();

        // Held until the hook returns
        let mut current = entry.paths.lock().await;
        *current = paths::resolve(descriptor, overrides)?;

        if plugin.hook_state(command) == HookState::NoOp {
            info!(
                "{} is not supported for {}, nothing to do",
                command, descriptor.name
            );
            return Ok(DispatchOutcome::Skipped);
        }

        let ctx = self.context(descriptor, &current)?;
        debug!("Dispatching {} for {}", command, descriptor.name);

        match command {
            CoinCommand::Info => plugin.info(&ctx).await?,
            CoinCommand::Download => {
                let overrides = match args {
                    CommandArgs::Download(o) => o.clone(),
                    _ => Default::default(),
                };
                plugin.download(&ctx, &overrides).await?
            }
            CoinCommand::Bootstrap => {
                let overrides = match args {
                    CommandArgs::Bootstrap(o) => o.clone(),
                    _ => Default::default(),
                };
                plugin.bootstrap(&ctx, &overrides).await?
            }
            CoinCommand::Configure => {
                let configure = match args {
                    CommandArgs::Configure(a) => a.clone(),
                    _ => Default::default(),
                };
                plugin.configure(&ctx, &configure).await?
            }
            CoinCommand::GetInfo => {
                return Ok(DispatchOutcome::DaemonInfo(plugin.getinfo(&ctx).await?));
            }
        }

        Ok(DispatchOutcome::Completed)
    }

    fn context(
        &self,
        descriptor: &CoinDescriptor,
        paths: &ResolvedPaths,
    ) -> Result<CoinContext, MnError> {
        let config = load_conf_file(&paths.config_file.path)?;
        let rpc = RpcClient::from_conf(descriptor, &config, self.rpc_timeout)?;

        Ok(CoinContext::new(
            descriptor.clone(),
            paths.clone(),
            config,
            RpcHandle::new(Arc::new(rpc)),
            self.artifacts.clone(),
        ))
    }
}
