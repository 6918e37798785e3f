//! Concatenation through FFmpeg's concat demuxer.

use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use reel_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// One file in a concatenation list, optionally cut short.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatEntry {
    pub path: PathBuf,
    /// Stop reading this file after this many seconds.
    pub outpoint: Option<f64>,
}

impl ConcatEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            outpoint: None,
        }
    }

    pub fn trimmed(path: impl Into<PathBuf>, outpoint: f64) -> Self {
        Self {
            path: path.into(),
            outpoint: Some(outpoint),
        }
    }
}

/// Render an `ffconcat` list. Entry order is playback order.
pub fn concat_list(entries: &[ConcatEntry]) -> String {
    let mut out = String::from("ffconcat version 1.0\n");
    for entry in entries {
        let _ = writeln!(out, "file {}", quote_path(&entry.path));
        if let Some(outpoint) = entry.outpoint {
            let _ = writeln!(out, "outpoint {:.6}", outpoint);
        }
    }
    out
}

/// Single-quote a path for the concat demuxer (`'` becomes `'\''`).
fn quote_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', "'\\''"))
}

/// Make list entries absolute so they don't resolve against the list's directory.
async fn absolutize(entries: &[ConcatEntry]) -> MediaResult<Vec<ConcatEntry>> {
    let mut resolved = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = tokio::fs::canonicalize(&entry.path)
            .await
            .map_err(|_| MediaError::FileNotFound(entry.path.clone()))?;
        resolved.push(ConcatEntry {
            path,
            outpoint: entry.outpoint,
        });
    }
    Ok(resolved)
}

async fn write_list(entries: &[ConcatEntry], list_path: &Path) -> MediaResult<()> {
    if entries.is_empty() {
        return Err(MediaError::invalid_input("nothing to concatenate"));
    }
    let entries = absolutize(entries).await?;
    tokio::fs::write(list_path, concat_list(&entries)).await?;
    Ok(())
}

fn demuxer_command(list_path: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(list_path, output).input_args(["-f", "concat", "-safe", "0"])
}

/// Join `inputs` in order without re-encoding.
pub async fn concat_stream_copy(
    inputs: &[PathBuf],
    list_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let entries: Vec<ConcatEntry> = inputs.iter().map(|p| ConcatEntry::new(p.clone())).collect();
    let list_path = list_path.as_ref();
    write_list(&entries, list_path).await?;

    info!(inputs = inputs.len(), "Concatenating with stream copy");
    let cmd = demuxer_command(list_path, output.as_ref())
        .stream_copy()
        .faststart();
    runner.run(&cmd).await
}

/// Join `entries` in order, re-encoding with `encoding` and honouring outpoints.
///
/// `bound` additionally caps the output length.
pub async fn concat_reencode(
    entries: &[ConcatEntry],
    list_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    encoding: &EncodingConfig,
    bound: Option<f64>,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let list_path = list_path.as_ref();
    write_list(entries, list_path).await?;

    info!(
        segments = entries.len(),
        codec = %encoding.codec,
        "Concatenating with re-encode"
    );
    let mut cmd = demuxer_command(list_path, output.as_ref()).output_args(encoding.to_ffmpeg_args());
    if let Some(seconds) = bound {
        cmd = cmd.output_duration(seconds);
    }
    runner.run(&cmd.faststart()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_list_preserves_order() {
        let list = concat_list(&[
            ConcatEntry::new("/w/video_003.mp4"),
            ConcatEntry::new("/w/video_001.mp4"),
            ConcatEntry::trimmed("/w/video_002.mp4", 5.0),
        ]);
        assert_eq!(
            list,
            "ffconcat version 1.0\n\
             file '/w/video_003.mp4'\n\
             file '/w/video_001.mp4'\n\
             file '/w/video_002.mp4'\n\
             outpoint 5.000000\n"
        );
    }

    #[test]
    fn test_quote_path_with_apostrophe() {
        assert_eq!(quote_path(Path::new("/w/it's.mp4")), "'/w/it'\\''s.mp4'");
    }

    #[test]
    fn test_demuxer_args() {
        let args = demuxer_command(Path::new("list.txt"), Path::new("out.mp4"))
            .stream_copy()
            .build_args()
            .join(" ");
        assert!(args.contains("-f concat -safe 0 -i list.txt -c copy"));
    }

    #[tokio::test]
    async fn test_missing_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = concat_stream_copy(
            &[dir.path().join("missing.mp4")],
            dir.path().join("list.txt"),
            dir.path().join("out.mp4"),
            &FfmpegRunner::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = concat_stream_copy(&[], dir.path().join("l.txt"), dir.path().join("o.mp4"), &FfmpegRunner::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidInput(_)));
    }
}
