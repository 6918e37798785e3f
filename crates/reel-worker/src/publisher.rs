//! Publishing local artifacts to the object store.

use std::path::Path;

use serde_json::json;
use tracing::{debug, info, warn};

use reel_media::remove_file_if_exists;
use reel_models::timing::{PROJECT_TAG, SCENE_TAG};
use reel_models::{BatchPublishReport, ProjectId, PublishItem, PublishedItem, TimingTags};
use reel_storage::keys::batch_item_key;
use reel_storage::ObjectStore;

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::stages;
use crate::timing::TimingLog;

/// Publish a terminal artifact under `key` and delete the local copy.
///
/// The local file is only removed after the store accepted it.
pub async fn publish_terminal(
    store: &dyn ObjectStore,
    path: &Path,
    key: &str,
    content_type: &str,
) -> WorkerResult<String> {
    let url = store.put_file(path, key, content_type).await?;
    match remove_file_if_exists(path).await {
        Ok(_) => debug!(path = %path.display(), "Removed published artifact"),
        Err(e) => warn!(path = %path.display(), "Failed to remove published artifact: {}", e),
    }
    Ok(url)
}

/// Publish `items` one by one, in order.
///
/// A failing item is counted and skipped; it never stops the rest of the
/// batch. Items are left on disk since they usually still feed later stages.
pub async fn publish_many(
    store: &dyn ObjectStore,
    timing: &TimingLog,
    project_id: &ProjectId,
    items: &[PublishItem],
) -> BatchPublishReport {
    let mut report = BatchPublishReport::default();

    for item in items {
        let key = batch_item_key(project_id, item.kind, item.scene_number);
        let mut tags = TimingTags::new();
        tags.insert(PROJECT_TAG.to_string(), json!(project_id.as_str()));
        if let Some(n) = item.scene_number {
            tags.insert(SCENE_TAG.to_string(), json!(n));
        }
        tags.insert("kind".to_string(), json!(item.kind.as_str()));

        let outcome = timing
            .measure(stages::BATCH_PUBLISH_ITEM, &tags, publish_item(store, item, &key))
            .await;
        match outcome {
            Ok(url) => report.uploaded.push(PublishedItem {
                kind: item.kind,
                scene_number: item.scene_number,
                key,
                url,
            }),
            Err(e) => {
                warn!(project_id = %project_id, key = %key, "Batch item failed: {}", e);
                report.failed_count += 1;
            }
        }
    }

    info!(
        project_id = %project_id,
        uploaded = report.uploaded.len(),
        failed = report.failed_count,
        "Batch publish finished"
    );
    report
}

async fn publish_item(store: &dyn ObjectStore, item: &PublishItem, key: &str) -> WorkerResult<String> {
    if !tokio::fs::try_exists(&item.local_path).await.unwrap_or(false) {
        return Err(WorkerError::resolution(format!(
            "batch item not found: {}",
            item.local_path.display()
        )));
    }
    Ok(store
        .put_file(&item.local_path, key, item.kind.content_type())
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingStore;
    use reel_models::ArtifactKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_partial_batch_keeps_going() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("image_scene_001.png");
        let video = dir.path().join("video_scene_003.mp4");
        tokio::fs::write(&image, b"png").await.unwrap();
        tokio::fs::write(&video, b"mp4").await.unwrap();

        let items = vec![
            PublishItem::new(ArtifactKind::Image, &image).for_scene(1),
            PublishItem::new(ArtifactKind::Audio, dir.path().join("missing.wav")).for_scene(2),
            PublishItem::new(ArtifactKind::SilentVideo, &video).for_scene(3),
        ];
        let store = RecordingStore::default();
        let timing = TimingLog::new(dir.path().join("performance.log"));

        let report = publish_many(&store, &timing, &ProjectId::new("proj"), &items).await;

        assert_eq!(report.failed_count, 1);
        assert_eq!(report.total(), 3);
        assert!(report.is_partial());
        let keys: Vec<&str> = report.uploaded.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "projects/proj/image_scene_001.png",
                "projects/proj/silent_video_scene_003.mp4"
            ]
        );
        assert_eq!(store.puts()[0].content_type, "image/png");
        // batch items stay on disk
        assert!(image.exists());

        let events = timing.events().await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].status, reel_models::TimingStatus::Error);
    }

    #[tokio::test]
    async fn test_store_failures_are_counted() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("narration.wav");
        tokio::fs::write(&audio, b"wav").await.unwrap();

        let store = RecordingStore::failing_on("audio");
        let timing = TimingLog::new(dir.path().join("performance.log"));
        let items = vec![
            PublishItem::new(ArtifactKind::Audio, &audio).for_scene(1),
            PublishItem::new(ArtifactKind::Audio, &audio).for_scene(2),
        ];
        let report = publish_many(&store, &timing, &ProjectId::new("p"), &items).await;
        assert!(report.uploaded.is_empty());
        assert_eq!(report.failed_count, 2);
    }

    #[tokio::test]
    async fn test_publish_terminal_removes_local_copy() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("final_p.mp4");
        tokio::fs::write(&video, b"mp4").await.unwrap();
        let store = RecordingStore::default();

        let url = publish_terminal(&store, &video, "videos/final_p_1.mp4", "video/mp4")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.test/videos/final_p_1.mp4");
        assert!(!video.exists());
    }

    #[tokio::test]
    async fn test_publish_terminal_keeps_file_on_failure() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("final_p.mp4");
        tokio::fs::write(&video, b"mp4").await.unwrap();
        let store = RecordingStore::failing_on("videos/");

        let err = publish_terminal(&store, &video, "videos/final_p_1.mp4", "video/mp4")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "publish_error");
        assert!(video.exists());
    }
}
