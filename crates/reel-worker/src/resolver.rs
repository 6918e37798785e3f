//! Asset resolution: turn a locator into a local file path.
//!
//! Local paths pass through untouched. Remote URLs are streamed to a
//! `.part` file in the unit's working directory and renamed into place
//! only after the whole body arrived, so a failed fetch never leaves a
//! file under the final name.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Url;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use reel_media::{move_file, partial_path, remove_file_if_exists};
use reel_models::Locator;

use crate::error::{WorkerError, WorkerResult};
use crate::workspace::WorkDir;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches remote inputs over HTTP(S).
#[derive(Debug, Clone)]
pub struct AssetResolver {
    http: reqwest::Client,
}

impl AssetResolver {
    pub fn new() -> WorkerResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| WorkerError::config_error(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Classify a raw input string.
    pub fn classify(raw: &str) -> WorkerResult<Locator> {
        Ok(Locator::parse(raw)?)
    }

    /// Resolve `locator` to a readable local file.
    ///
    /// Remote inputs are stored as `file_name` inside `dir` and the whole
    /// fetch is bounded by `timeout`.
    pub async fn resolve(
        &self,
        locator: &Locator,
        dir: &WorkDir,
        file_name: &str,
        timeout: Duration,
    ) -> WorkerResult<PathBuf> {
        match locator {
            Locator::Local(path) => {
                if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                    return Err(WorkerError::resolution(format!(
                        "local input not found: {}",
                        path.display()
                    )));
                }
                debug!(path = %path.display(), "Using local input");
                Ok(path.clone())
            }
            Locator::Remote(url) => {
                let dest = dir.file(file_name)?;
                let bytes = self.fetch(url, &dest, timeout).await?;
                info!(url = %url, dest = %dest.display(), bytes, "Fetched remote input");
                Ok(dest)
            }
        }
    }

    async fn fetch(&self, url: &Url, dest: &Path, timeout: Duration) -> WorkerResult<u64> {
        let part = partial_path(dest);
        match self.stream_to(url, &part, timeout).await {
            Ok(bytes) => {
                move_file(&part, dest).await?;
                Ok(bytes)
            }
            Err(e) => {
                let _ = remove_file_if_exists(&part).await;
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &Url, part: &Path, timeout: Duration) -> WorkerResult<u64> {
        let response = self
            .http
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| fetch_error(url, e))?
            .error_for_status()
            .map_err(|e| fetch_error(url, e))?;

        let mut file = tokio::fs::File::create(part).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let data = chunk.map_err(|e| fetch_error(url, e))?;
            file.write_all(&data).await?;
            written += data.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

fn fetch_error(url: &Url, err: reqwest::Error) -> WorkerError {
    if err.is_timeout() {
        WorkerError::resolution(format!("timed out fetching {url}"))
    } else if let Some(status) = err.status() {
        WorkerError::resolution(format!("GET {url} returned {status}"))
    } else {
        WorkerError::resolution(format!("GET {url} failed: {err}"))
    }
}
