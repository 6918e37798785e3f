//! Audio/video muxing.

use std::path::Path;
use tracing::info;

use reel_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Output length for a mux: the shorter input, so the result never ends in
/// silence or a frozen frame.
pub fn mux_bound(video_duration: f64, audio_duration: f64) -> f64 {
    video_duration.min(audio_duration)
}

fn mux_command(
    video: &Path,
    audio: &Path,
    output: &Path,
    bound: f64,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    FfmpegCommand::new(video, output)
        .add_input(audio)
        .map("0:v:0")
        .map("1:a:0")
        .video_codec("copy")
        .output_args(encoding.audio_args())
        .output_duration(bound)
        .faststart()
}

/// Put the first audio stream of `audio` under the first video stream of
/// `video`, cut to `bound` seconds. Video is copied, audio re-encoded.
pub async fn mux_audio(
    video: impl AsRef<Path>,
    audio: impl AsRef<Path>,
    output: impl AsRef<Path>,
    bound: f64,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    if !bound.is_finite() || bound <= 0.0 {
        return Err(MediaError::invalid_input(format!(
            "mux bound must be positive, got {bound}"
        )));
    }

    info!(bound_secs = bound, "Muxing narration audio");
    let cmd = mux_command(
        video.as_ref(),
        audio.as_ref(),
        output.as_ref(),
        bound,
        encoding,
    );
    runner.run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_is_shorter_input() {
        assert_eq!(mux_bound(10.0, 7.5), 7.5);
        assert_eq!(mux_bound(6.0, 9.0), 6.0);
    }

    #[test]
    fn test_mux_maps_streams_explicitly() {
        let cmd = mux_command(
            Path::new("v.mp4"),
            Path::new("a.wav"),
            Path::new("o.mp4"),
            7.5,
            &EncodingConfig::default(),
        );
        let args = cmd.build_args().join(" ");
        assert!(args.contains("-i v.mp4 -i a.wav"));
        assert!(args.contains("-map 0:v:0 -map 1:a:0 -c:v copy -c:a aac -b:a 192k -t 7.500"));
    }

    #[tokio::test]
    async fn test_rejects_zero_bound() {
        let err = mux_audio("v.mp4", "a.wav", "o.mp4", 0.0, &EncodingConfig::default(), &FfmpegRunner::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidInput(_)));
    }
}
