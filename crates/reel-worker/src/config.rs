//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use reel_models::encoding::{DEFAULT_FPS, DEFAULT_HW_CODEC, DEFAULT_VISIBILITY_RATIO};

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root for `projects/` and `scratch/` working directories
    pub work_dir: PathBuf,
    /// NDJSON timing log
    pub timing_log_path: PathBuf,
    /// Timeout for fetching remote video/audio inputs
    pub fetch_timeout: Duration,
    /// Timeout for fetching remote images
    pub image_fetch_timeout: Duration,
    /// Upper bound on any single encoder or prober run
    pub encoder_timeout: Duration,
    /// Frame rate of rendered pan/zoom clips
    pub fps: u32,
    /// Share of the image visible along the pan axis
    pub visibility_ratio: f64,
    /// Karaoke line budget in characters
    pub karaoke_max_chars: usize,
    /// Karaoke font size in script pixels
    pub karaoke_font_size: u32,
    /// Encoder used by the synthetic load test
    pub hw_encoder: String,
    /// Timeout for delivering completion callbacks
    pub callback_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/reel"),
            timing_log_path: PathBuf::from("logs/performance.log"),
            fetch_timeout: Duration::from_secs(60),
            image_fetch_timeout: Duration::from_secs(30),
            encoder_timeout: Duration::from_secs(1800), // 30 minutes
            fps: DEFAULT_FPS,
            visibility_ratio: DEFAULT_VISIBILITY_RATIO,
            karaoke_max_chars: 25,
            karaoke_font_size: 130,
            hw_encoder: DEFAULT_HW_CODEC.to_string(),
            callback_timeout: Duration::from_secs(10),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("REEL_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            timing_log_path: std::env::var("REEL_TIMING_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.timing_log_path),
            fetch_timeout: Duration::from_secs(env_or("REEL_FETCH_TIMEOUT_SECS", 60)),
            image_fetch_timeout: Duration::from_secs(env_or("REEL_IMAGE_FETCH_TIMEOUT_SECS", 30)),
            encoder_timeout: Duration::from_secs(env_or("REEL_ENCODER_TIMEOUT_SECS", 1800)),
            fps: env_or("REEL_FPS", defaults.fps),
            visibility_ratio: env_or("REEL_VISIBILITY_RATIO", defaults.visibility_ratio),
            karaoke_max_chars: env_or("REEL_KARAOKE_MAX_CHARS", defaults.karaoke_max_chars),
            karaoke_font_size: env_or("REEL_KARAOKE_FONT_SIZE", defaults.karaoke_font_size),
            hw_encoder: std::env::var("REEL_HW_ENCODER").unwrap_or(defaults.hw_encoder),
            callback_timeout: Duration::from_secs(env_or("REEL_CALLBACK_TIMEOUT_SECS", 10)),
        }
    }

    /// Reject values the pipelines cannot run with.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.fps == 0 {
            return Err(WorkerError::config_error("REEL_FPS must be positive"));
        }
        if !(self.visibility_ratio > 0.0 && self.visibility_ratio <= 1.0) {
            return Err(WorkerError::config_error(format!(
                "REEL_VISIBILITY_RATIO must be in (0, 1], got {}",
                self.visibility_ratio
            )));
        }
        if self.karaoke_max_chars == 0 {
            return Err(WorkerError::config_error("REEL_KARAOKE_MAX_CHARS must be positive"));
        }
        if self.encoder_timeout.is_zero() {
            return Err(WorkerError::config_error("REEL_ENCODER_TIMEOUT_SECS must be positive"));
        }
        Ok(())
    }

    /// Root of project-scoped working directories.
    pub fn projects_dir(&self) -> PathBuf {
        self.work_dir.join("projects")
    }

    /// Root of ephemeral per-unit directories.
    pub fn scratch_dir(&self) -> PathBuf {
        self.work_dir.join("scratch")
    }

    /// Config rooted in `dir`, for tests and tools.
    pub fn rooted_at(dir: impl Into<PathBuf>) -> Self {
        let work_dir = dir.into();
        Self {
            timing_log_path: work_dir.join("performance.log"),
            work_dir,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = WorkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.projects_dir(), PathBuf::from("/tmp/reel/projects"));
        assert_eq!(config.scratch_dir(), PathBuf::from("/tmp/reel/scratch"));
    }

    #[test]
    fn test_invalid_ratio() {
        let config = WorkerConfig {
            visibility_ratio: 1.2,
            ..WorkerConfig::default()
        };
        assert!(matches!(config.validate(), Err(WorkerError::ConfigError(_))));
    }

    #[test]
    fn test_rooted_at() {
        let config = WorkerConfig::rooted_at("/srv/reel");
        assert_eq!(config.timing_log_path, PathBuf::from("/srv/reel/performance.log"));
        assert_eq!(config.fps, 30);
    }
}
