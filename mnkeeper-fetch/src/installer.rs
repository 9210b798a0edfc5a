//! Artifact installer: download, verify, unpack

use sdk::{CompressionKind, MnError};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::{download, extract, verifier, ArtifactFetcher};

/// One artifact to bring onto local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Source URL
    pub url: String,
    /// How the download is packed
    pub compression: CompressionKind,
    /// Expected SHA-256 (hex); `None` skips verification
    pub expected_sha256: Option<String>,
    /// Directory the artifact is unpacked into
    pub destination: PathBuf,
}

impl FetchRequest {
    /// Name used when an uncompressed artifact is copied into place
    pub fn file_name(&self) -> String {
        self.url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("download")
            .to_string()
    }
}

/// What a successful install produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArtifact {
    pub destination: PathBuf,
    pub bytes: u64,
    pub files: usize,
}

impl ArtifactFetcher {
    /// Download `request.url` into a private temp file, verify it when a
    /// checksum is known, then unpack it into `request.destination`.
    ///
    /// Refuses to run when `already_installed` is set. The temp file is
    /// removed whether the pipeline succeeds or fails, and the destination is
    /// never written before verification passes.
    pub async fn fetch_and_install(
        &self,
        request: &FetchRequest,
        already_installed: bool,
    ) -> Result<InstalledArtifact, MnError> {
        if already_installed {
            return Err(MnError::AlreadyInstalled(request.destination.clone()));
        }
        if request.url.trim().is_empty() {
            return Err(MnError::FetchFailed {
                url: String::new(),
                reason: "no download URL".to_string(),
            });
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("mnkeeper-").suffix(".part");
        let temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let outcome = self.run_pipeline(request, &temp).await;
        discard(temp);
        outcome
    }

    async fn run_pipeline(
        &self,
        request: &FetchRequest,
        temp: &NamedTempFile,
    ) -> Result<InstalledArtifact, MnError> {
        info!("Downloading {}", request.url);
        let bytes = download::download_to_path(
            &self.client,
            &request.url,
            temp.path(),
            self.progress.as_ref(),
        )
        .await?;
        info!("Downloaded {} bytes", bytes);

        if let Some(expected) = request
            .expected_sha256
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            let path = temp.path().to_path_buf();
            let expected = expected.to_string();
            run_blocking(move || verifier::verify_file(&path, &expected)).await?;
            info!("Checksum verified");
        }

        let src = temp.path().to_path_buf();
        let dest = request.destination.clone();
        let kind = request.compression;
        let name = request.file_name();
        let files = run_blocking(move || extract::extract(kind, &src, &dest, &name)).await?;

        info!(
            "Installed {} file(s) into {}",
            files,
            request.destination.display()
        );
        Ok(InstalledArtifact {
            destination: request.destination.clone(),
            bytes,
            files,
        })
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, MnError>
where
    F: FnOnce() -> Result<T, MnError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MnError::ExtractionFailed(format!("worker task failed: {}", e)))?
}

fn discard(temp: NamedTempFile) {
    let path = temp.path().to_path_buf();
    if let Err(e) = temp.close() {
        warn!("Failed to remove temp file {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> FetchRequest {
        FetchRequest {
            url: url.to_string(),
            compression: CompressionKind::None,
            expected_sha256: None,
            destination: PathBuf::from("/tmp/unused"),
        }
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            request("https://host/releases/chain.dat.zip?x=1").file_name(),
            "chain.dat.zip"
        );
        assert_eq!(request("https://host/").file_name(), "download");
    }

    #[tokio::test]
    async fn test_already_installed_short_circuits() {
        let fetcher = ArtifactFetcher::new("test", std::time::Duration::from_secs(5)).unwrap();
        let result = fetcher
            .fetch_and_install(&request("http://127.0.0.1:1/never"), true)
            .await;
        assert!(matches!(result, Err(MnError::AlreadyInstalled(_))));
    }

    #[tokio::test]
    async fn test_empty_url_is_fetch_failed() {
        let fetcher = ArtifactFetcher::new("test", std::time::Duration::from_secs(5)).unwrap();
        let result = fetcher.fetch_and_install(&request("  "), false).await;
        assert!(matches!(result, Err(MnError::FetchFailed { .. })));
    }
}
