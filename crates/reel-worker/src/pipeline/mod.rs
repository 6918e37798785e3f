//! Pipeline orchestration.
//!
//! Each public unit (`image_to_video`, `merge_audio`, `concatenate`,
//! `synthetic_load_test`) runs resolve → render/merge → overlay → publish
//! as an ordered list of stages. Every stage is timed, and every unit ends
//! in a structured result; errors never escape the unit boundary.

mod concatenate;
mod image_to_video;
mod load_test;
mod merge_audio;
pub mod stages;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::task::JoinHandle;

use reel_media::FfmpegRunner;
use reel_models::timing::{PROJECT_TAG, SCENE_TAG};
use reel_models::{
    Artifact, BatchPublishReport, CompletionNotice, DownloadRequest, EncodingConfig, MergeRequest,
    ProjectId, PublishBatchRequest, Scene, TimingTags, UnitResult,
};
use reel_storage::ObjectStore;

use crate::callback::CallbackNotifier;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::UnitLogger;
use crate::publisher::{publish_many, publish_terminal};
use crate::resolver::AssetResolver;
use crate::timing::{StageClock, TimingLog};
use crate::workspace::{WorkDir, WorkspaceManager};

/// Runs pipeline units against shared configuration, storage and timing log.
///
/// Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<WorkerConfig>,
    workspace: WorkspaceManager,
    resolver: AssetResolver,
    store: Arc<dyn ObjectStore>,
    timing: Arc<TimingLog>,
    notifier: CallbackNotifier,
    runner: FfmpegRunner,
    encoding: EncodingConfig,
}

impl Orchestrator {
    pub fn new(config: WorkerConfig, store: Arc<dyn ObjectStore>) -> WorkerResult<Self> {
        config.validate()?;
        Ok(Self {
            workspace: WorkspaceManager::new(&config),
            resolver: AssetResolver::new()?,
            timing: Arc::new(TimingLog::new(&config.timing_log_path)),
            notifier: CallbackNotifier::new(config.callback_timeout)?,
            runner: FfmpegRunner::new().with_timeout(config.encoder_timeout.as_secs()),
            encoding: EncodingConfig::default(),
            store,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn timing(&self) -> &TimingLog {
        &self.timing
    }

    pub fn workspace(&self) -> &WorkspaceManager {
        &self.workspace
    }

    fn probe_timeout(&self) -> Option<Duration> {
        Some(self.config.encoder_timeout)
    }

    /// Render a scene on a background task and post its completion notice to
    /// `scene.callback_url`, if any.
    pub fn spawn_image_to_video(&self, scene: Scene) -> JoinHandle<UnitResult> {
        let orchestrator = self.clone();
        let id = scene.scene_id.to_string();
        let callback = scene.callback_url.clone();
        self.spawn_unit(id, callback, async move { orchestrator.image_to_video(&scene).await })
    }

    /// Merge narration on a background task and post its completion notice to
    /// `request.callback_url`, if any.
    pub fn spawn_merge_audio(&self, request: MergeRequest) -> JoinHandle<UnitResult> {
        let orchestrator = self.clone();
        let id = request.scene_id.to_string();
        let callback = request.callback_url.clone();
        self.spawn_unit(id, callback, async move { orchestrator.merge_audio(&request).await })
    }

    fn spawn_unit<F>(&self, id: String, callback: Option<String>, unit: F) -> JoinHandle<UnitResult>
    where
        F: std::future::Future<Output = UnitResult> + Send + 'static,
    {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            // run the unit on its own task so a panic still produces a result
            let result = match tokio::spawn(unit).await {
                Ok(result) => result,
                Err(e) => UnitResult::failed(&id, "internal_error", format!("unit task failed: {e}")),
            };
            if let Some(url) = callback {
                notifier.notify(&url, &CompletionNotice::from(&result)).await;
            }
            result
        })
    }

    /// Publish several project artifacts independently.
    ///
    /// The whole batch is recorded as one `BATCH_PUBLISH` timing entry, with
    /// status error when the request is rejected or any item fails.
    pub async fn publish_batch(&self, request: &PublishBatchRequest) -> WorkerResult<BatchPublishReport> {
        let logger = UnitLogger::new(request.project_id.as_str(), stages::BATCH_PUBLISH);
        let tags = unit_tags(Some(&request.project_id), None);
        let clock = StageClock::start();

        if let Err(e) = request.validate() {
            let e = WorkerError::from(e);
            self.timing
                .record(stages::BATCH_PUBLISH, &tags, &clock, Some(&e.to_string()))
                .await;
            logger.log_error(&e.detail());
            return Err(e);
        }
        logger.log_start(&format!("{} items", request.items.len()));

        let report = publish_many(
            self.store.as_ref(),
            &self.timing,
            &request.project_id,
            &request.items,
        )
        .await;

        if report.is_partial() {
            let partial = WorkerError::PartialBatch {
                failed: report.failed_count,
                total: report.total(),
            }
            .to_string();
            self.timing
                .record(stages::BATCH_PUBLISH, &tags, &clock, Some(&partial))
                .await;
            logger.log_warning(&partial);
        } else {
            self.timing
                .record(stages::BATCH_PUBLISH, &tags, &clock, None)
                .await;
            logger.log_completion(&format!("{} items uploaded", report.uploaded.len()));
        }
        Ok(report)
    }

    /// Fetch an asset into a project directory under `file_name`.
    pub async fn download_to_local(&self, request: &DownloadRequest) -> UnitResult {
        let logger = UnitLogger::new(&request.file_name, stages::ASSET_DOWNLOAD);
        let tags = unit_tags(Some(&request.project_id), None);
        let clock = StageClock::start();

        let result = self.run_download(request).await;

        self.finish_unit(&request.file_name, stages::ASSET_DOWNLOAD, &tags, &clock, &logger, result)
            .await
    }

    /// Remove a project's working directory.
    pub async fn cleanup_project(&self, project_id: &ProjectId) -> UnitResult {
        let logger = UnitLogger::new(project_id.as_str(), stages::PROJECT_CLEANUP);
        let tags = unit_tags(Some(project_id), None);
        let clock = StageClock::start();

        let result = match self.workspace.cleanup_project(project_id).await {
            Ok(removed) => {
                if !removed {
                    logger.log_progress("nothing to remove");
                }
                Ok(UnitResult::succeeded(project_id.as_str()))
            }
            Err(e) => Err(e),
        };

        self.finish_unit(project_id.as_str(), stages::PROJECT_CLEANUP, &tags, &clock, &logger, result)
            .await
    }

    async fn run_download(&self, request: &DownloadRequest) -> WorkerResult<UnitResult> {
        let dir = self.workspace.get_or_create(Some(&request.project_id)).await?;
        let path = self
            .resolver
            .resolve(&request.locator, &dir, &request.file_name, self.config.fetch_timeout)
            .await?;
        Ok(UnitResult::local(&request.file_name, path, None))
    }

    /// Unit boundary: record the whole-unit timing and fold errors into a
    /// failed result.
    async fn finish_unit(
        &self,
        id: &str,
        operation: &str,
        tags: &TimingTags,
        clock: &StageClock,
        logger: &UnitLogger,
        result: WorkerResult<UnitResult>,
    ) -> UnitResult {
        let error = result.as_ref().err().map(|e| e.to_string());
        self.timing.record(operation, tags, clock, error.as_deref()).await;

        match result {
            Ok(outcome) => {
                logger.log_completion(&format!(
                    "{} in {:.1}s",
                    outcome.artifact_locator().unwrap_or_default(),
                    clock.elapsed_secs()
                ));
                outcome
            }
            Err(e) => {
                logger.log_error(&e.detail());
                UnitResult::failed(id, e.kind(), e.to_string())
            }
        }
    }

    /// Publish `artifact` under `key` and delete it, or keep it local when
    /// `skip_publish` is set.
    async fn deliver(
        &self,
        id: &str,
        artifact: Artifact,
        key: &str,
        skip_publish: bool,
        stage: &str,
        tags: &TimingTags,
    ) -> WorkerResult<UnitResult> {
        if skip_publish {
            return Ok(UnitResult::local(id, artifact.local_path, artifact.duration));
        }
        let url = self
            .timing
            .measure(
                stage,
                tags,
                publish_terminal(
                    self.store.as_ref(),
                    &artifact.local_path,
                    key,
                    artifact.kind.content_type(),
                ),
            )
            .await?;
        Ok(UnitResult::published(id, url, artifact.duration))
    }

    async fn teardown(&self, dir: &WorkDir) {
        self.workspace.teardown_quietly(dir).await;
    }
}

/// Timing tags identifying a unit's project and scene.
fn unit_tags(project_id: Option<&ProjectId>, scene_number: Option<u32>) -> TimingTags {
    let mut tags = TimingTags::new();
    if let Some(project) = project_id {
        tags.insert(PROJECT_TAG.to_string(), json!(project.as_str()));
    }
    if let Some(n) = scene_number {
        tags.insert(SCENE_TAG.to_string(), json!(n));
    }
    tags
}

/// Seconds since the epoch, used to version published keys.
fn publish_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// A locator's extension when it looks like one, else `fallback`.
fn extension_or(ext: Option<String>, fallback: &str) -> String {
    ext.filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingStore;
    use reel_models::{ArtifactKind, ConcatRequest, LoadTestRequest, Locator, PublishItem, TimingStatus};
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn orchestrator(root: &TempDir) -> (Orchestrator, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore::default());
        let orchestrator =
            Orchestrator::new(WorkerConfig::rooted_at(root.path()), store.clone()).unwrap();
        (orchestrator, store)
    }

    #[tokio::test]
    async fn test_single_remote_concat_is_returned_unchanged() {
        let root = TempDir::new().unwrap();
        let (orchestrator, store) = orchestrator(&root);
        let url = "https://cdn.example.com/videos/merged_s1_1700000000.mp4";
        let request = ConcatRequest {
            project_id: ProjectId::new("p1"),
            videos: vec![Locator::parse(url).unwrap()],
        };

        let result = orchestrator.concatenate(&request).await;

        assert!(result.success);
        assert_eq!(result.video_url.as_deref(), Some(url));
        assert!(store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_single_local_concat_is_published_and_project_removed() {
        let root = TempDir::new().unwrap();
        let (orchestrator, store) = orchestrator(&root);
        let project = ProjectId::new("p2");
        let dir = orchestrator.workspace().get_or_create(Some(&project)).await.unwrap();
        let clip = dir.file("merged_scene_001.mp4").unwrap();
        tokio::fs::write(&clip, b"mp4").await.unwrap();

        let request = ConcatRequest {
            project_id: project.clone(),
            videos: vec![Locator::Local(clip)],
        };
        let result = orchestrator.concatenate(&request).await;

        assert!(result.success, "{:?}", result.error);
        let puts = store.puts();
        assert_eq!(puts.len(), 1);
        assert!(puts[0].key.starts_with("videos/final_p2_"));
        assert_eq!(puts[0].content_type, "video/mp4");
        assert!(!dir.path().exists());
    }

    #[tokio::test]
    async fn test_empty_concat_is_a_validation_failure() {
        let root = TempDir::new().unwrap();
        let (orchestrator, _) = orchestrator(&root);
        let request = ConcatRequest {
            project_id: ProjectId::new("p3"),
            videos: Vec::new(),
        };

        let result = orchestrator.concatenate(&request).await;

        assert!(!result.success);
        assert_eq!(result.id, "p3");
        assert_eq!(result.error_kind.as_deref(), Some("validation_error"));
    }

    #[tokio::test]
    async fn test_failed_concat_still_removes_project_dir() {
        let root = TempDir::new().unwrap();
        let (orchestrator, _) = orchestrator(&root);
        let project = ProjectId::new("p4");
        let dir = orchestrator.workspace().get_or_create(Some(&project)).await.unwrap();
        let request = ConcatRequest {
            project_id: project,
            videos: vec![
                Locator::Local(root.path().join("missing_a.mp4")),
                Locator::Local(root.path().join("missing_b.mp4")),
            ],
        };

        let result = orchestrator.concatenate(&request).await;

        assert_eq!(result.error_kind.as_deref(), Some("resolution_error"));
        assert!(!dir.path().exists());
    }

    #[tokio::test]
    async fn test_unreachable_image_is_a_resolution_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let root = TempDir::new().unwrap();
        let (orchestrator, store) = orchestrator(&root);
        let scene = Scene::new(
            "s1",
            Locator::parse(&format!("{}/img/1.png", server.uri())).unwrap(),
            5.0,
        )
        .with_project(ProjectId::new("p5"), 1);

        let result = orchestrator.image_to_video(&scene).await;

        assert!(!result.success);
        assert_eq!(result.id, "s1");
        assert_eq!(result.error_kind.as_deref(), Some("resolution_error"));
        assert!(store.puts().is_empty());

        let events = orchestrator.timing().events().await.unwrap();
        let ops: Vec<&str> = events.iter().map(|e| e.operation.as_str()).collect();
        assert_eq!(ops, vec![stages::IMAGE_RESOLVE, stages::IMAGE_TO_VIDEO]);
        assert!(events.iter().all(|e| e.status == TimingStatus::Error));
        assert_eq!(events[0].project_id(), Some("p5"));
        assert_eq!(events[0].scene_key().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_invalid_scene_duration() {
        let root = TempDir::new().unwrap();
        let (orchestrator, _) = orchestrator(&root);
        let scene = Scene::new("s0", Locator::Local(root.path().join("a.png")), 0.0);

        let result = orchestrator.image_to_video(&scene).await;

        assert_eq!(result.error_kind.as_deref(), Some("validation_error"));
    }

    #[tokio::test]
    async fn test_skip_publish_needs_a_project() {
        let root = TempDir::new().unwrap();
        let (orchestrator, _) = orchestrator(&root);
        let mut scene = Scene::new("s2", Locator::Local(root.path().join("a.png")), 3.0);
        scene.skip_publish = true;

        let result = orchestrator.image_to_video(&scene).await;

        assert_eq!(result.error_kind.as_deref(), Some("validation_error"));
    }

    #[tokio::test]
    async fn test_load_test_rejects_non_positive_target() {
        let root = TempDir::new().unwrap();
        let (orchestrator, _) = orchestrator(&root);
        let request = LoadTestRequest {
            sources: vec![Locator::parse("https://cdn.example.com/a.mp4").unwrap()],
            target_duration: 0.0,
            test_name: "gpu_test".to_string(),
        };

        let result = orchestrator.synthetic_load_test(&request).await;

        assert!(!result.outcome.success);
        assert_eq!(result.outcome.error_kind.as_deref(), Some("validation_error"));
        assert!(result.report.is_none());
    }

    #[tokio::test]
    async fn test_background_failure_reaches_callback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/done"))
            .and(body_partial_json(serde_json::json!({
                "scene_id": "bg-1",
                "status": "failed"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let root = TempDir::new().unwrap();
        let (orchestrator, _) = orchestrator(&root);
        let mut scene = Scene::new("bg-1", Locator::Local(root.path().join("absent.png")), 4.0);
        scene.callback_url = Some(format!("{}/done", server.uri()));

        let result = orchestrator.spawn_image_to_video(scene).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.error_kind.as_deref(), Some("resolution_error"));
    }

    #[tokio::test]
    async fn test_publish_batch_rejects_empty() {
        let root = TempDir::new().unwrap();
        let (orchestrator, _) = orchestrator(&root);
        let request = PublishBatchRequest {
            project_id: ProjectId::new("p6"),
            items: Vec::new(),
        };
        let err = orchestrator.publish_batch(&request).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let events = orchestrator.timing().events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].operation, stages::BATCH_PUBLISH);
        assert_eq!(events[0].status, TimingStatus::Error);
        assert_eq!(events[0].project_id(), Some("p6"));
    }

    #[tokio::test]
    async fn test_partial_batch_is_recorded_as_error() {
        let root = TempDir::new().unwrap();
        let (orchestrator, store) = orchestrator(&root);
        let image = root.path().join("image_scene_001.png");
        tokio::fs::write(&image, b"png").await.unwrap();
        let request = PublishBatchRequest {
            project_id: ProjectId::new("p8"),
            items: vec![
                PublishItem::new(ArtifactKind::Image, &image).for_scene(1),
                PublishItem::new(ArtifactKind::Image, root.path().join("gone.png")).for_scene(2),
            ],
        };

        let report = orchestrator.publish_batch(&request).await.unwrap();

        assert_eq!(report.uploaded.len(), 1);
        assert_eq!(report.failed_count, 1);
        assert_eq!(store.puts().len(), 1);
        let events = orchestrator.timing().events().await.unwrap();
        let batch: Vec<_> = events
            .iter()
            .filter(|e| e.operation == stages::BATCH_PUBLISH)
            .collect();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].status, TimingStatus::Error);
    }

    #[tokio::test]
    async fn test_download_and_cleanup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/voice.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3".to_vec()))
            .mount(&server)
            .await;

        let root = TempDir::new().unwrap();
        let (orchestrator, _) = orchestrator(&root);
        let project = ProjectId::new("p7");
        let request = DownloadRequest {
            locator: Locator::parse(&format!("{}/voice.mp3", server.uri())).unwrap(),
            project_id: project.clone(),
            file_name: "audio_scene_001.mp3".to_string(),
        };

        let result = orchestrator.download_to_local(&request).await;
        assert!(result.success, "{:?}", result.error);
        let local = result.local_path.unwrap();
        assert_eq!(tokio::fs::read(&local).await.unwrap(), b"ID3");

        let cleanup = orchestrator.cleanup_project(&project).await;
        assert!(cleanup.success);
        assert!(!local.exists());
    }

    #[test]
    fn test_extension_or() {
        assert_eq!(extension_or(Some("png".into()), "jpg"), "png");
        assert_eq!(extension_or(None, "jpg"), "jpg");
        assert_eq!(extension_or(Some("php?x=1".into()), "jpg"), "jpg");
    }
}
