//! Artifacts handed from one stage to the next.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What a file produced or consumed by the pipeline contains.
///
/// The kind alone decides the published content type and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Image,
    Audio,
    SilentVideo,
    SubtitledVideo,
    MergedVideo,
    FinalVideo,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::SilentVideo => "silent_video",
            Self::SubtitledVideo => "subtitled_video",
            Self::MergedVideo => "merged_video",
            Self::FinalVideo => "final_video",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Image => "image/png",
            Self::Audio => "audio/wav",
            _ => "video/mp4",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Image => "png",
            Self::Audio => "wav",
            _ => "mp4",
        }
    }

    pub fn is_video(&self) -> bool {
        !matches!(self, Self::Image | Self::Audio)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file produced by exactly one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub local_path: PathBuf,
    pub kind: ArtifactKind,
    /// Media duration in seconds, when known.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Artifact {
    pub fn new(local_path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            local_path: local_path.into(),
            kind,
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn path(&self) -> &Path {
        &self.local_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(ArtifactKind::Image.content_type(), "image/png");
        assert_eq!(ArtifactKind::Audio.extension(), "wav");
        assert_eq!(ArtifactKind::MergedVideo.content_type(), "video/mp4");
        assert!(ArtifactKind::FinalVideo.is_video());
        assert!(!ArtifactKind::Audio.is_video());
    }

    #[test]
    fn test_kind_serde() {
        let kind: ArtifactKind = serde_json::from_str("\"silent_video\"").unwrap();
        assert_eq!(kind, ArtifactKind::SilentVideo);
    }
}
