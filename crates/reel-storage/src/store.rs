//! Publishing seam used by the pipelines.

use async_trait::async_trait;
use std::path::Path;

use crate::client::R2Client;
use crate::error::{StorageError, StorageResult};

/// Something that can take a local file and make it publicly reachable.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `path` under `key` and return the public URL.
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<String>;
}

#[async_trait]
impl ObjectStore for R2Client {
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<String> {
        self.upload_file(path, key, content_type).await
    }
}

/// Store used when no object storage is configured.
///
/// Every publish fails with the configuration problem it was built with,
/// so units that keep artifacts local still run.
#[derive(Debug, Clone)]
pub struct DisabledStore {
    reason: String,
}

impl DisabledStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for DisabledStore {
    async fn put_file(&self, _path: &Path, key: &str, _content_type: &str) -> StorageResult<String> {
        Err(StorageError::config_error(format!(
            "cannot publish {key}: {}",
            self.reason
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_store_rejects_publish() {
        let store = DisabledStore::new("R2_ENDPOINT_URL not set");
        let err = store
            .put_file(Path::new("/tmp/x.mp4"), "videos/x.mp4", "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
        assert!(err.to_string().contains("R2_ENDPOINT_URL not set"));
    }
}
