//! Shared fixtures for engine integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use mnkeeper_engine::registry::CoinRegistry;
use mnkeeper_fetch::ArtifactFetcher;
use sdk::{
    ArtifactHandle, BootstrapArtifact, BootstrapOverrides, CoinCommand, CoinContext,
    CoinDescriptor, CoinPlugin, CompressionKind, ConfMap, ConfigureArgs, DaemonInfo,
    DownloadOverrides, HookState, MnError, ResolvedPaths, WalletArtifact,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn descriptor(name: &str, root: &Path) -> CoinDescriptor {
    CoinDescriptor {
        name: name.to_string(),
        port: 40000,
        rpc_port: 40001,
        daemon_bin: format!("{}d", name),
        status_bin: format!("{}-cli", name),
        config_file: format!("{}.conf", name),
        default_wallet_path: root.join("wallet").display().to_string(),
        default_bin_subpath: "bin".to_string(),
        default_data_path: root.join("data").display().to_string(),
        wallet: WalletArtifact {
            version: "1.0".to_string(),
            url: String::new(),
            compression: CompressionKind::TarGzip,
            sha256: String::new(),
        },
        bootstrap: BootstrapArtifact {
            url: String::new(),
            compression: CompressionKind::Zip,
        },
    }
}

pub fn registry() -> CoinRegistry {
    let fetcher = ArtifactFetcher::new("mnkeeper-test", Duration::from_secs(10))
        .expect("http client");
    CoinRegistry::new(ArtifactHandle::new(Arc::new(fetcher)), Duration::from_secs(2))
}

const GETINFO_OK: u8 = 0;
const GETINFO_UNREACHABLE: u8 = 1;
const GETINFO_UNAUTHORIZED: u8 = 2;

/// Scriptable coin plugin that records what the registry hands it
pub struct FakeCoin {
    descriptor: CoinDescriptor,
    states: HashMap<CoinCommand, HookState>,
    getinfo_mode: AtomicU8,
    delay: Duration,
    in_flight: AtomicBool,
    pub overlapped: AtomicBool,
    pub getinfo_calls: AtomicU64,
    pub calls: Mutex<Vec<CoinCommand>>,
    pub seen_paths: Mutex<Vec<ResolvedPaths>>,
    pub seen_config: Mutex<Vec<ConfMap>>,
}

impl FakeCoin {
    pub fn new(name: &str, root: &Path) -> Self {
        Self {
            descriptor: descriptor(name, root),
            states: HashMap::new(),
            getinfo_mode: AtomicU8::new(GETINFO_OK),
            delay: Duration::ZERO,
            in_flight: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
            getinfo_calls: AtomicU64::new(0),
            calls: Mutex::new(Vec::new()),
            seen_paths: Mutex::new(Vec::new()),
            seen_config: Mutex::new(Vec::new()),
        }
    }

    pub fn with_hook(mut self, command: CoinCommand, state: HookState) -> Self {
        self.states.insert(command, state);
        self
    }

    /// Every hook sleeps this long while marked in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_getinfo_ok(&self, ok: bool) {
        let mode = if ok { GETINFO_OK } else { GETINFO_UNREACHABLE };
        self.getinfo_mode.store(mode, Ordering::SeqCst);
    }

    /// The daemon answers but rejects the credentials
    pub fn set_getinfo_unauthorized(&self) {
        self.getinfo_mode.store(GETINFO_UNAUTHORIZED, Ordering::SeqCst);
    }

    pub fn getinfo_count(&self) -> u64 {
        self.getinfo_calls.load(Ordering::SeqCst)
    }

    pub fn called(&self) -> Vec<CoinCommand> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, command: CoinCommand, ctx: &CoinContext) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.calls.lock().unwrap().push(command);
        self.seen_paths.lock().unwrap().push(ctx.paths.clone());
        self.seen_config.lock().unwrap().push(ctx.config.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl CoinPlugin for FakeCoin {
    fn descriptor(&self) -> &CoinDescriptor {
        &self.descriptor
    }

    fn hook_state(&self, command: CoinCommand) -> HookState {
        self.states
            .get(&command)
            .copied()
            .unwrap_or(HookState::Implemented)
    }

    async fn info(&self, ctx: &CoinContext) -> Result<(), MnError> {
        self.enter(CoinCommand::Info, ctx).await;
        Ok(())
    }

    async fn download(
        &self,
        ctx: &CoinContext,
        _overrides: &DownloadOverrides,
    ) -> Result<(), MnError> {
        self.enter(CoinCommand::Download, ctx).await;
        Ok(())
    }

    async fn bootstrap(
        &self,
        ctx: &CoinContext,
        _overrides: &BootstrapOverrides,
    ) -> Result<(), MnError> {
        self.enter(CoinCommand::Bootstrap, ctx).await;
        Ok(())
    }

    async fn configure(&self, ctx: &CoinContext, _args: &ConfigureArgs) -> Result<(), MnError> {
        self.enter(CoinCommand::Configure, ctx).await;
        Ok(())
    }

    async fn getinfo(&self, ctx: &CoinContext) -> Result<DaemonInfo, MnError> {
        self.getinfo_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(CoinCommand::GetInfo, ctx).await;
        match self.getinfo_mode.load(Ordering::SeqCst) {
            GETINFO_OK => Ok(DaemonInfo {
                starting_up: false,
                details: serde_json::json!({"blocks": 1}),
            }),
            GETINFO_UNAUTHORIZED => Err(MnError::AuthorizationFailed),
            _ => Err(MnError::TransportUnavailable("connection refused".to_string())),
        }
    }
}
