//! Video encoding configuration.

use serde::{Deserialize, Serialize};

/// Default software video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default hardware video codec
pub const DEFAULT_HW_CODEC: &str = "h264_nvenc";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "medium";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 23;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Output pixel format, playable everywhere
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// Rendered clip resolution
pub const OUTPUT_WIDTH: u32 = 1920;
pub const OUTPUT_HEIGHT: u32 = 1080;
/// Rendered clip frame rate
pub const DEFAULT_FPS: u32 = 30;
/// Share of the image kept inside the crop window along the pan axis
pub const DEFAULT_VISIBILITY_RATIO: f64 = 0.90;

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264", "h264_nvenc")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "p4")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Use hardware acceleration (NVENC)
    #[serde(default)]
    pub use_nvenc: bool,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            use_nvenc: false,
        }
    }
}

impl EncodingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Switch to a hardware encoder such as `h264_nvenc`.
    pub fn with_hardware_encoder(mut self, codec: impl Into<String>) -> Self {
        self.use_nvenc = true;
        self.codec = codec.into();
        self.preset = "p4".to_string();
        self
    }

    /// Use `codec`, switching to NVENC settings only for NVENC encoders.
    pub fn for_encoder(self, codec: impl Into<String>) -> Self {
        let codec = codec.into();
        if codec.ends_with("_nvenc") {
            self.with_hardware_encoder(codec)
        } else {
            Self {
                codec,
                use_nvenc: false,
                ..self
            }
        }
    }

    /// Enable NVENC hardware acceleration.
    pub fn with_nvenc(self) -> Self {
        self.with_hardware_encoder(DEFAULT_HW_CODEC)
    }

    /// Video-only encoder arguments.
    pub fn video_args(&self) -> Vec<String> {
        let quality_flag = if self.use_nvenc { "-cq" } else { "-crf" };
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            quality_flag.to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            DEFAULT_PIXEL_FORMAT.to_string(),
        ]
    }

    /// Audio encoder arguments.
    pub fn audio_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }

    /// Convert to FFmpeg command arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = self.video_args();
        args.extend(self.audio_args());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_encoder() {
        let hw = EncodingConfig::default().for_encoder("hevc_nvenc");
        assert!(hw.use_nvenc);
        assert_eq!(hw.preset, "p4");
        assert!(hw.video_args().contains(&"-cq".to_string()));

        let sw = EncodingConfig::default().for_encoder("libx264");
        assert!(!sw.use_nvenc);
        assert_eq!(sw.preset, "medium");
        assert!(sw.video_args().contains(&"-crf".to_string()));
    }

    #[test]
    fn test_default_config() {
        let config = EncodingConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.preset, "medium");
        assert_eq!(config.crf, 23);
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = EncodingConfig::default().to_ffmpeg_args();
        assert!(args.contains(&"-crf".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
        assert!(args.contains(&"aac".to_string()));
    }

    #[test]
    fn test_nvenc_config() {
        let config = EncodingConfig::default().with_nvenc();
        let args = config.video_args();
        assert!(args.contains(&"h264_nvenc".to_string()));
        assert!(args.contains(&"-cq".to_string()));
        assert!(!args.contains(&"-crf".to_string()));
    }
}
