//! Worker error types.
//!
//! Variants follow the pipeline's failure taxonomy; [`WorkerError::kind`]
//! is the stable tag reported in unit results.

use thiserror::Error;

use reel_media::MediaError;
use reel_models::ModelError;
use reel_storage::StorageError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Fetching an input failed or timed out.
    #[error("Resolution failed: {0}")]
    Resolution(String),

    /// The encoder or prober failed.
    #[error("External tool failed: {0}")]
    ExternalTool(#[from] MediaError),

    /// The object store rejected a publish.
    #[error("Publish failed: {0}")]
    Publish(#[from] StorageError),

    /// Structurally invalid input, rejected before any stage runs.
    #[error("Validation failed: {0}")]
    Validation(#[from] ModelError),

    #[error("{failed} of {total} batch items failed")]
    PartialBatch { failed: usize, total: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(ModelError::validation(msg))
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable snake_case tag for structured results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "resolution_error",
            Self::ExternalTool(_) => "external_tool_error",
            Self::Publish(_) => "publish_error",
            Self::Validation(_) => "validation_error",
            Self::PartialBatch { .. } => "partial_batch_failure",
            Self::ConfigError(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Json(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Message plus any diagnostic output retained from an external tool.
    pub fn detail(&self) -> String {
        match self {
            Self::ExternalTool(media) => match media.diagnostics() {
                Some(stderr) => format!("{self}\n{stderr}"),
                None => self.to_string(),
            },
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(WorkerError::resolution("x").kind(), "resolution_error");
        assert_eq!(WorkerError::validation("x").kind(), "validation_error");
        assert_eq!(
            WorkerError::from(MediaError::FfmpegNotFound).kind(),
            "external_tool_error"
        );
        assert_eq!(
            WorkerError::from(StorageError::upload_failed("x")).kind(),
            "publish_error"
        );
        assert_eq!(
            WorkerError::PartialBatch { failed: 1, total: 3 }.to_string(),
            "1 of 3 batch items failed"
        );
    }

    #[test]
    fn test_detail_includes_tool_output() {
        let err = WorkerError::from(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("Invalid data found when processing input".to_string()),
            Some(1),
        ));
        assert!(err.detail().ends_with("Invalid data found when processing input"));
        assert!(!err.to_string().contains("Invalid data"));
    }
}
