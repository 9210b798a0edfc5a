//! mnkeeper artifact fetcher
//!
//! Downloads wallet bundles and blockchain bootstrap snapshots, checks them
//! against published SHA-256 sums and unpacks them into place. Plugins reach
//! this crate through the `ArtifactHandle` on their context.

pub mod download;
pub mod extract;
pub mod installer;
pub mod verifier;

pub use download::{stderr_progress, ProgressFn};
pub use installer::{FetchRequest, InstalledArtifact};

use async_trait::async_trait;
use sdk::{ArtifactHandleImpl, BootstrapArtifact, MnError, ResolvedPaths, WalletArtifact};
use std::path::PathBuf;
use std::time::Duration;

/// HTTP-backed artifact installer
#[derive(Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
    progress: Option<ProgressFn>,
    temp_dir: Option<PathBuf>,
}

impl ArtifactFetcher {
    /// Build a fetcher with the given user agent and whole-request timeout
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, MnError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| MnError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            progress: None,
            temp_dir: None,
        })
    }

    /// Report download progress through `progress`
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Stage downloads in `dir` instead of the system temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl ArtifactHandleImpl for ArtifactFetcher {
    async fn install_wallet(
        &self,
        artifact: &WalletArtifact,
        paths: &ResolvedPaths,
    ) -> Result<PathBuf, MnError> {
        let request = FetchRequest {
            url: artifact.url.clone(),
            compression: artifact.compression,
            expected_sha256: Some(artifact.sha256.clone()).filter(|s| !s.is_empty()),
            destination: paths.wallet_root.path.clone(),
        };
        let installed = self
            .fetch_and_install(&request, paths.wallet_installed())
            .await?;
        Ok(installed.destination)
    }

    async fn install_bootstrap(
        &self,
        artifact: &BootstrapArtifact,
        paths: &ResolvedPaths,
    ) -> Result<PathBuf, MnError> {
        let request = FetchRequest {
            url: artifact.url.clone(),
            compression: artifact.compression,
            expected_sha256: None,
            destination: paths.data_dir.path.clone(),
        };
        let installed = self
            .fetch_and_install(&request, paths.data_dir.exists)
            .await?;
        Ok(installed.destination)
    }
}
