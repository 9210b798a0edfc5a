//! Streaming HTTP download with progress reporting

use reqwest::Client;
use sdk::MnError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Progress callback: `(bytes_read, total_bytes)`
///
/// Only invoked when the server announces a content length.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Progress reporter that rewrites a single stderr line
pub fn stderr_progress() -> ProgressFn {
    Arc::new(|read, total| {
        let percent = (read as f64 / total as f64) * 100.0;
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r{:6.2}% Done -- {}/{}", percent, read, total);
        if read >= total {
            let _ = writeln!(stderr);
        }
    })
}

/// Stream `url` into the file at `dest`, returning the number of bytes written
pub async fn download_to_path(
    client: &Client,
    url: &str,
    dest: &Path,
    progress: Option<&ProgressFn>,
) -> Result<u64, MnError> {
    let fetch_failed = |reason: String| MnError::FetchFailed {
        url: url.to_string(),
        reason,
    };

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_failed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(fetch_failed(format!("HTTP {}", response.status())));
    }

    let total = response.content_length();
    debug!("Download of {} started, content length {:?}", url, total);

    let mut out = tokio::fs::File::create(dest).await?;
    let mut read: u64 = 0;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| fetch_failed(e.to_string()))?
    {
        out.write_all(&chunk).await?;
        read += chunk.len() as u64;

        if let (Some(total), Some(report)) = (total, progress) {
            if total > 0 {
                report(read, total);
            }
        }
    }

    out.flush().await?;
    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_reports_progress() {
        let server = MockServer::start().await;
        let body = vec![7u8; 4096];
        Mock::given(method("GET"))
            .and(path("/file.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let last = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&last);
        let progress: ProgressFn = Arc::new(move |read, total| {
            assert!(read <= total);
            seen.store(read, Ordering::SeqCst);
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("file.bin");
        let written = download_to_path(
            &Client::new(),
            &format!("{}/file.bin", server.uri()),
            &dest,
            Some(&progress),
        )
        .await
        .unwrap();

        assert_eq!(written, 4096);
        assert_eq!(last.load(Ordering::SeqCst), 4096);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_download_http_error_is_fetch_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let result = download_to_path(
            &Client::new(),
            &format!("{}/missing", server.uri()),
            &dir.path().join("out"),
            None,
        )
        .await;

        assert!(matches!(result, Err(MnError::FetchFailed { .. })));
    }
}
