//! JSON commands accepted by the worker binary.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use reel_models::{
    ConcatRequest, DownloadRequest, LoadTestRequest, MergeRequest, ProjectId, PublishBatchRequest,
    Scene, UnitResult,
};

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::Orchestrator;

/// One unit of work, tagged by `operation`.
#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum WorkerCommand {
    ImageToVideo(Scene),
    MergeAudio(MergeRequest),
    Concatenate(ConcatRequest),
    SyntheticLoadTest(LoadTestRequest),
    PublishBatch(PublishBatchRequest),
    DownloadToLocal(DownloadRequest),
    CleanupProject {
        project_id: ProjectId,
    },
    TimingSummary,
    TimingProjects {
        #[serde(default)]
        project_id: Option<String>,
    },
    TimingClear,
}

impl WorkerCommand {
    pub fn parse(input: &str) -> WorkerResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| WorkerError::validation(format!("invalid command: {e}")))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ImageToVideo(_) => "image_to_video",
            Self::MergeAudio(_) => "merge_audio",
            Self::Concatenate(_) => "concatenate",
            Self::SyntheticLoadTest(_) => "synthetic_load_test",
            Self::PublishBatch(_) => "publish_batch",
            Self::DownloadToLocal(_) => "download_to_local",
            Self::CleanupProject { .. } => "cleanup_project",
            Self::TimingSummary => "timing_summary",
            Self::TimingProjects { .. } => "timing_projects",
            Self::TimingClear => "timing_clear",
        }
    }

    /// Run the command and render its outcome as JSON.
    ///
    /// Scenes and merges that carry a callback URL run as background units so
    /// their completion notice is delivered.
    pub async fn execute(self, orchestrator: &Orchestrator) -> Value {
        let name = self.name();
        match self {
            Self::ImageToVideo(scene) if scene.callback_url.is_some() => {
                let id = scene.scene_id.to_string();
                let handle = orchestrator.spawn_image_to_video(scene);
                to_json(&join_unit(&id, handle).await)
            }
            Self::ImageToVideo(scene) => to_json(&orchestrator.image_to_video(&scene).await),
            Self::MergeAudio(request) if request.callback_url.is_some() => {
                let id = request.scene_id.to_string();
                let handle = orchestrator.spawn_merge_audio(request);
                to_json(&join_unit(&id, handle).await)
            }
            Self::MergeAudio(request) => to_json(&orchestrator.merge_audio(&request).await),
            Self::Concatenate(request) => to_json(&orchestrator.concatenate(&request).await),
            Self::SyntheticLoadTest(request) => {
                to_json(&orchestrator.synthetic_load_test(&request).await)
            }
            Self::PublishBatch(request) => match orchestrator.publish_batch(&request).await {
                Ok(report) => json!({
                    "success": !report.is_partial(),
                    "id": request.project_id.as_str(),
                    "uploaded": report.uploaded,
                    "failed_count": report.failed_count,
                }),
                Err(e) => to_json(&UnitResult::failed(
                    request.project_id.as_str(),
                    e.kind(),
                    e.to_string(),
                )),
            },
            Self::DownloadToLocal(request) => {
                to_json(&orchestrator.download_to_local(&request).await)
            }
            Self::CleanupProject { project_id } => {
                to_json(&orchestrator.cleanup_project(&project_id).await)
            }
            Self::TimingSummary => match orchestrator.timing().summary().await {
                Ok(stats) => json!({ "success": true, "id": name, "operations": stats }),
                Err(e) => to_json(&UnitResult::failed(name, e.kind(), e.to_string())),
            },
            Self::TimingProjects { project_id } => {
                match orchestrator
                    .timing()
                    .project_breakdown(project_id.as_deref())
                    .await
                {
                    Ok(projects) => json!({ "success": true, "id": name, "projects": projects }),
                    Err(e) => to_json(&UnitResult::failed(name, e.kind(), e.to_string())),
                }
            }
            Self::TimingClear => match orchestrator.timing().clear().await {
                Ok(()) => to_json(&UnitResult::succeeded(name)),
                Err(e) => to_json(&UnitResult::failed(name, e.kind(), e.to_string())),
            },
        }
    }
}

async fn join_unit(id: &str, handle: tokio::task::JoinHandle<UnitResult>) -> UnitResult {
    match handle.await {
        Ok(result) => result,
        Err(e) => UnitResult::failed(id, "internal_error", format!("unit task failed: {e}")),
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        json!({
            "success": false,
            "error": format!("failed to serialize result: {e}"),
            "error_kind": "internal_error",
        })
    })
}
