//! Burn a subtitle script into a video.

use std::path::Path;
use tracing::info;

use reel_models::EncodingConfig;

use super::ass;
use super::layout::SubtitleScript;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Write `script` next to the output as `.ass` and re-encode `video` with it drawn in.
///
/// Audio, if present, is copied untouched.
pub async fn burn_subtitles(
    video: impl AsRef<Path>,
    script: &SubtitleScript,
    script_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let script_path = script_path.as_ref();
    tokio::fs::write(script_path, ass::render(script)).await?;

    info!(
        events = script.events.len(),
        script = %script_path.display(),
        "Burning subtitles"
    );

    let cmd = overlay_command(video.as_ref(), script_path, output.as_ref(), encoding);
    runner.run(&cmd).await
}

fn overlay_command(video: &Path, script_path: &Path, output: &Path, encoding: &EncodingConfig) -> FfmpegCommand {
    FfmpegCommand::new(video, output)
        .video_filter(format!("ass={}", escape_filter_path(script_path)))
        .output_args(encoding.video_args())
        .audio_codec("copy")
        .faststart()
}

/// Escape a path for use as a filter option value inside a filtergraph.
///
/// FFmpeg unescapes twice: once when splitting the filtergraph and once when
/// parsing the filter's options.
fn escape_filter_path(path: &Path) -> String {
    let option = backslash_escape(&path.to_string_lossy(), &['\\', '\'', ':']);
    backslash_escape(&option, &['\\', '\'', '[', ']', ',', ';'])
}

fn backslash_escape(raw: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(
            escape_filter_path(Path::new("/tmp/reel/p1/karaoke_scene_001.ass")),
            "/tmp/reel/p1/karaoke_scene_001.ass"
        );
        assert_eq!(
            escape_filter_path(Path::new("C:/a,b.ass")),
            "C\\\\:/a\\,b.ass"
        );
        assert_eq!(
            escape_filter_path(Path::new("/tmp/it's [1].ass")),
            "/tmp/it\\\\\\'s \\[1\\].ass"
        );
    }

    #[test]
    fn test_overlay_copies_audio() {
        let cmd = overlay_command(
            Path::new("in.mp4"),
            Path::new("subs.ass"),
            Path::new("out.mp4"),
            &EncodingConfig::default(),
        );
        let args = cmd.build_args().join(" ");
        assert!(args.contains("-vf ass=subs.ass"));
        assert!(args.contains("-c:a copy"));
        assert!(args.contains("-c:v libx264"));
    }
}
