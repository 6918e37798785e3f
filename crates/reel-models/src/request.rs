//! Request shapes for the non-scene pipelines.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::artifact::ArtifactKind;
use crate::error::{ModelError, ModelResult};
use crate::locator::Locator;
use crate::scene::{ProjectId, SceneId};
use crate::subtitle::WordTiming;

/// Default load test length (15 minutes).
pub const DEFAULT_LOAD_TEST_DURATION: f64 = 900.0;
pub const DEFAULT_LOAD_TEST_NAME: &str = "gpu_test";

/// Mux narration audio onto a rendered scene clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub scene_id: SceneId,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub scene_number: Option<u32>,
    #[serde(alias = "video_url")]
    pub video: Locator,
    #[serde(alias = "audio_url")]
    pub audio: Locator,
    /// Narration text for karaoke captions; none or blank skips the overlay.
    #[serde(default)]
    pub narration: Option<String>,
    /// Word-level timestamps, used instead of uniform division when present.
    #[serde(default)]
    pub word_timings: Option<Vec<WordTiming>>,
    #[serde(default)]
    pub skip_publish: bool,
    #[serde(default)]
    pub callback_url: Option<String>,
}

impl MergeRequest {
    pub fn new(scene_id: impl Into<String>, video: Locator, audio: Locator) -> Self {
        Self {
            scene_id: SceneId::new(scene_id),
            project_id: None,
            scene_number: None,
            video,
            audio,
            narration: None,
            word_timings: None,
            skip_publish: false,
            callback_url: None,
        }
    }

    pub fn file_tag(&self) -> String {
        self.scene_id.file_tag(self.scene_number)
    }

    /// Narration text with surrounding whitespace removed, if any words remain.
    pub fn narration_text(&self) -> Option<&str> {
        self.narration
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Join per-scene clips, in order, into the final video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcatRequest {
    pub project_id: ProjectId,
    #[serde(alias = "video_urls")]
    pub videos: Vec<Locator>,
}

impl ConcatRequest {
    pub fn validate(&self) -> ModelResult<()> {
        if self.videos.is_empty() {
            return Err(ModelError::validation("no videos to concatenate"));
        }
        Ok(())
    }
}

fn default_load_test_duration() -> f64 {
    DEFAULT_LOAD_TEST_DURATION
}

fn default_load_test_name() -> String {
    DEFAULT_LOAD_TEST_NAME.to_string()
}

/// Loop a set of source clips up to a target length through the hardware encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTestRequest {
    #[serde(alias = "video_urls")]
    pub sources: Vec<Locator>,
    #[serde(
        alias = "target_duration_seconds",
        default = "default_load_test_duration"
    )]
    pub target_duration: f64,
    #[serde(default = "default_load_test_name")]
    pub test_name: String,
}

impl LoadTestRequest {
    pub fn validate(&self) -> ModelResult<()> {
        if self.sources.is_empty() {
            return Err(ModelError::validation("load test needs at least one source"));
        }
        if !self.target_duration.is_finite() || self.target_duration <= 0.0 {
            return Err(ModelError::validation(format!(
                "target duration must be positive, got {}",
                self.target_duration
            )));
        }
        Ok(())
    }
}

/// One local file to publish as part of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishItem {
    pub kind: ArtifactKind,
    pub local_path: PathBuf,
    #[serde(default)]
    pub scene_number: Option<u32>,
}

impl PublishItem {
    pub fn new(kind: ArtifactKind, local_path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            local_path: local_path.into(),
            scene_number: None,
        }
    }

    pub fn for_scene(mut self, scene_number: u32) -> Self {
        self.scene_number = Some(scene_number);
        self
    }
}

/// Publish many project artifacts independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishBatchRequest {
    pub project_id: ProjectId,
    pub items: Vec<PublishItem>,
}

impl PublishBatchRequest {
    pub fn validate(&self) -> ModelResult<()> {
        if self.items.is_empty() {
            return Err(ModelError::validation("publish batch is empty"));
        }
        Ok(())
    }
}

/// Materialize a remote asset into a project directory under a given name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    #[serde(alias = "url")]
    pub locator: Locator,
    pub project_id: ProjectId,
    #[serde(alias = "filename")]
    pub file_name: String,
}
