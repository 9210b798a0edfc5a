//! PIVX coin plugin
//!
//! Registers the PIVX wallet release, its bootstrap snapshot and the
//! masternode configuration layout with mnkeeper.

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use sdk::conf::write_conf_file;
use sdk::{
    BootstrapArtifact, BootstrapOverrides, CoinCommand, CoinContext, CoinDescriptor, CoinPlugin,
    CompressionKind, ConfMap, ConfigureArgs, DaemonInfo, DownloadOverrides, HookState, MnError,
    WalletArtifact,
};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// RPC error code pivxd returns while it is still loading
pub const RPC_IN_WARMUP: i64 = -28;

const WALLET_VERSION: &str = "2.2.1";
const WALLET_URL: &str = "https://github.com/PIVX-Project/PIVX/releases/download/v2.2.1/pivx-2.2.1-x86_64-linux-gnu.tar.gz";
const WALLET_SHA256: &str = "401e238e1989b2efdc6d2ac0af3944f1277b2807f79319ad1366248e870e8fcf";
const BOOTSTRAP_URL: &str = "https://github.com/PIVX-Project/PIVX/releases/download/v2.2.1/pivx-chain-721000-bootstrap.dat.zip";

pub struct Pivx {
    descriptor: CoinDescriptor,
}

impl Pivx {
    pub fn new() -> Self {
        Self {
            descriptor: CoinDescriptor {
                name: "pivx".to_string(),
                port: 51472,
                rpc_port: 51473,
                daemon_bin: "pivxd".to_string(),
                status_bin: "pivx-cli".to_string(),
                config_file: "pivx.conf".to_string(),
                default_wallet_path: "~/pivx".to_string(),
                default_bin_subpath: format!("pivx-{}/bin", WALLET_VERSION),
                default_data_path: "~/.pivx".to_string(),
                wallet: WalletArtifact {
                    version: WALLET_VERSION.to_string(),
                    url: WALLET_URL.to_string(),
                    compression: CompressionKind::TarGzip,
                    sha256: WALLET_SHA256.to_string(),
                },
                bootstrap: BootstrapArtifact {
                    url: BOOTSTRAP_URL.to_string(),
                    compression: CompressionKind::Zip,
                },
            },
        }
    }

    /// Settings written by `configure`
    fn masternode_conf(&self, ip: IpAddr, masternode_key: &str) -> ConfMap {
        let addr = match ip {
            IpAddr::V4(v4) => format!("{}:{}", v4, self.descriptor.port),
            IpAddr::V6(v6) => format!("[{}]:{}", v6, self.descriptor.port),
        };

        [
            ("rpcuser", random_hex(32)),
            ("rpcpassword", random_hex(64)),
            ("rpcallowip", "127.0.0.1".to_string()),
            ("listen", "1".to_string()),
            ("server", "1".to_string()),
            ("daemon", "1".to_string()),
            ("#masternode", "1".to_string()),
            ("maxconnections", "256".to_string()),
            ("bind", "0.0.0.0".to_string()),
            ("externalip", ip.to_string()),
            ("masternodeaddr", addr),
            ("#masternodeprivkey", masternode_key.to_string()),
        ]
        .into_iter()
        .collect()
    }
}

impl Default for Pivx {
    fn default() -> Self {
        Self::new()
    }
}

/// The plugin as the registry expects it
pub fn plugin() -> Arc<dyn CoinPlugin> {
    Arc::new(Pivx::new())
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[async_trait]
impl CoinPlugin for Pivx {
    fn descriptor(&self) -> &CoinDescriptor {
        &self.descriptor
    }

    fn hook_state(&self, command: CoinCommand) -> HookState {
        match command {
            CoinCommand::Download if self.descriptor.wallet.version.is_empty() => HookState::NoOp,
            CoinCommand::Bootstrap if self.descriptor.bootstrap.url.is_empty() => HookState::NoOp,
            _ => HookState::Implemented,
        }
    }

    async fn info(&self, ctx: &CoinContext) -> Result<(), MnError> {
        println!("Info for PIVX:");
        println!("  * Wallet version:      {}", self.descriptor.wallet.version);
        print!("{}", ctx.paths);
        Ok(())
    }

    async fn download(
        &self,
        ctx: &CoinContext,
        overrides: &DownloadOverrides,
    ) -> Result<(), MnError> {
        println!(
            "Attempting to download PIVX wallet into {}",
            ctx.paths.bin_dir.path.display()
        );
        let artifact = self.descriptor.wallet.with_overrides(overrides)?;
        let dest = ctx.artifacts.install_wallet(&artifact, &ctx.paths).await?;
        println!("PIVX wallet installed into {}", dest.display());
        Ok(())
    }

    async fn bootstrap(
        &self,
        ctx: &CoinContext,
        overrides: &BootstrapOverrides,
    ) -> Result<(), MnError> {
        println!(
            "Attempting to bootstrap PIVX data into {}",
            ctx.paths.data_dir.path.display()
        );
        let artifact = self.descriptor.bootstrap.with_overrides(overrides)?;
        let dest = ctx
            .artifacts
            .install_bootstrap(&artifact, &ctx.paths)
            .await?;
        println!("PIVX bootstrap unpacked into {}", dest.display());
        Ok(())
    }

    async fn configure(&self, ctx: &CoinContext, args: &ConfigureArgs) -> Result<(), MnError> {
        let conf_path = &ctx.paths.config_file.path;
        println!("Attempting to configure {}", conf_path.display());

        if args.ip.trim().is_empty() {
            return Err(MnError::InvalidArgument(
                "no IP specified (use '--ip A.B.C.D')".to_string(),
            ));
        }
        let ip: IpAddr = args.ip.trim().parse().map_err(|_| {
            MnError::InvalidArgument(format!("'{}' is not an IPv4 or IPv6 address", args.ip))
        })?;
        if args.masternode_key.trim().is_empty() {
            return Err(MnError::InvalidArgument(
                "no masternode private key specified (use '--mnpkey KEY')".to_string(),
            ));
        }

        if !ctx.paths.data_dir.exists {
            info!("Creating data directory {}", ctx.paths.data_dir.path.display());
            std::fs::create_dir_all(&ctx.paths.data_dir.path)?;
        }

        let conf = self.masternode_conf(ip, args.masternode_key.trim());
        write_conf_file(conf_path, &conf)?;
        println!("Wrote {} settings to {}", conf.len(), conf_path.display());
        Ok(())
    }

    async fn getinfo(&self, ctx: &CoinContext) -> Result<DaemonInfo, MnError> {
        let rsp = ctx.rpc.call("getinfo", vec![]).await?;

        match rsp.error {
            Some(err) if err.code == RPC_IN_WARMUP => {
                println!("pivxd starting up -- {}", err.message);
                Ok(DaemonInfo {
                    starting_up: true,
                    details: rsp.result,
                })
            }
            Some(err) if err.code != 0 => Err(MnError::Rpc {
                code: err.code,
                message: err.message,
            }),
            _ => {
                debug!("getinfo returned {}", rsp.result);
                Ok(DaemonInfo {
                    starting_up: false,
                    details: rsp.result,
                })
            }
        }
    }
}
