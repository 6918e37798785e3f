//! Shared data models for the narrated reel pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Asset locators (local path or remote URL)
//! - Scenes and the per-pipeline request shapes
//! - Artifacts and their kind tags
//! - Subtitle cues and word timings
//! - Encoding configuration
//! - Timing log records
//! - Structured unit results and completion notices

pub mod artifact;
pub mod encoding;
pub mod error;
pub mod locator;
pub mod request;
pub mod result;
pub mod scene;
pub mod subtitle;
pub mod timing;
pub mod utils;

// Re-export common types
pub use artifact::{Artifact, ArtifactKind};
pub use encoding::EncodingConfig;
pub use error::{ModelError, ModelResult};
pub use locator::Locator;
pub use request::{
    ConcatRequest, DownloadRequest, LoadTestRequest, MergeRequest, PublishBatchRequest,
    PublishItem,
};
pub use result::{
    BatchPublishReport, CompletionNotice, CompletionStatus, LoadTestReport, LoadTestResult,
    PublishedItem, UnitResult,
};
pub use scene::{PanDirection, ProjectId, Scene, SceneId};
pub use subtitle::{SubtitleCue, WordTiming};
pub use timing::{TimingEvent, TimingStatus, TimingTags};
pub use utils::sanitize_component;
