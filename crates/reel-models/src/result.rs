//! Structured results returned at each unit's top-level boundary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::artifact::ArtifactKind;

/// Outcome of one externally triggered unit.
///
/// Failures never escape as panics or raw errors; they are folded into
/// `success: false` with the error text and its taxonomy tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitResult {
    pub success: bool,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl UnitResult {
    pub fn published(id: impl Into<String>, url: impl Into<String>, duration: Option<f64>) -> Self {
        Self {
            success: true,
            id: id.into(),
            video_url: Some(url.into()),
            local_path: None,
            duration,
            error: None,
            error_kind: None,
        }
    }

    /// Success with no artifact attached.
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: id.into(),
            video_url: None,
            local_path: None,
            duration: None,
            error: None,
            error_kind: None,
        }
    }

    pub fn local(id: impl Into<String>, path: impl Into<PathBuf>, duration: Option<f64>) -> Self {
        Self {
            success: true,
            id: id.into(),
            video_url: None,
            local_path: Some(path.into()),
            duration,
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(id: impl Into<String>, kind: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: id.into(),
            video_url: None,
            local_path: None,
            duration: None,
            error: Some(error.into()),
            error_kind: Some(kind.to_string()),
        }
    }

    /// Where the produced artifact can be found: its URL, else its local path.
    pub fn artifact_locator(&self) -> Option<String> {
        self.video_url.clone().or_else(|| {
            self.local_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    Failed,
}

/// Notification delivered once a background unit finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionNotice {
    pub scene_id: String,
    pub status: CompletionStatus,
    pub video_url: Option<String>,
    pub error: Option<String>,
}

impl From<&UnitResult> for CompletionNotice {
    fn from(result: &UnitResult) -> Self {
        Self {
            scene_id: result.id.clone(),
            status: if result.success {
                CompletionStatus::Completed
            } else {
                CompletionStatus::Failed
            },
            video_url: result.artifact_locator(),
            error: result.error.clone(),
        }
    }
}

/// Measurements from one synthetic load test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTestReport {
    pub test_name: String,
    pub video_url: String,
    pub source_count: usize,
    pub segment_count: usize,
    pub target_duration: f64,
    pub output_duration: f64,
    pub download_secs: f64,
    pub encode_secs: f64,
    pub upload_secs: f64,
    pub total_secs: f64,
    /// Seconds of output produced per second of encoding.
    pub encode_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTestResult {
    #[serde(flatten)]
    pub outcome: UnitResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<LoadTestReport>,
}

/// One successfully published batch item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedItem {
    pub kind: ArtifactKind,
    #[serde(default)]
    pub scene_number: Option<u32>,
    pub key: String,
    pub url: String,
}

/// Aggregate outcome of a batch publish.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchPublishReport {
    pub uploaded: Vec<PublishedItem>,
    pub failed_count: usize,
}

impl BatchPublishReport {
    pub fn total(&self) -> usize {
        self.uploaded.len() + self.failed_count
    }

    pub fn is_partial(&self) -> bool {
        self.failed_count > 0
    }
}
