//! In-memory object store for unit tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use reel_storage::{ObjectStore, StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPut {
    pub path: PathBuf,
    pub key: String,
    pub content_type: String,
    pub size: u64,
}

/// Records every publish; rejects keys containing `fail_marker`.
#[derive(Debug, Default)]
pub struct RecordingStore {
    puts: Mutex<Vec<RecordedPut>>,
    fail_marker: Option<String>,
}

impl RecordingStore {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            puts: Mutex::new(Vec::new()),
            fail_marker: Some(marker.to_string()),
        }
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<String> {
        if self.fail_marker.as_deref().is_some_and(|m| key.contains(m)) {
            return Err(StorageError::upload_failed(format!("{key}: rejected")));
        }
        let size = tokio::fs::metadata(path).await?.len();
        self.puts.lock().unwrap().push(RecordedPut {
            path: path.to_path_buf(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            size,
        });
        Ok(format!("https://cdn.test/{key}"))
    }
}
