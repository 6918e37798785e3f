//! Pan/zoom clip rendering.
//!
//! Frames are rendered on a blocking thread and streamed into FFmpeg's stdin
//! as raw RGB through a bounded channel, so at most a handful of frames are
//! ever held in memory.

use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info};

use reel_models::encoding::{DEFAULT_FPS, DEFAULT_VISIBILITY_RATIO, OUTPUT_HEIGHT, OUTPUT_WIDTH};
use reel_models::{EncodingConfig, PanDirection};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::geometry::PanGeometry;

/// Frames buffered between the renderer thread and the encoder.
const FRAME_QUEUE_DEPTH: usize = 8;

/// Parameters for one pan/zoom clip.
#[derive(Debug, Clone)]
pub struct KenBurnsOptions {
    pub direction: PanDirection,
    pub visibility_ratio: f64,
    pub duration: f64,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub encoding: EncodingConfig,
}

impl KenBurnsOptions {
    pub fn new(direction: PanDirection, duration: f64) -> Self {
        Self {
            direction,
            visibility_ratio: DEFAULT_VISIBILITY_RATIO,
            duration,
            fps: DEFAULT_FPS,
            width: OUTPUT_WIDTH,
            height: OUTPUT_HEIGHT,
            encoding: EncodingConfig::default(),
        }
    }

    pub fn with_visibility_ratio(mut self, ratio: f64) -> Self {
        self.visibility_ratio = ratio;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Encoder command reading raw frames from stdin. The clip has no audio.
    pub fn command(&self, output: impl AsRef<Path>) -> FfmpegCommand {
        FfmpegCommand::from_stdin(output)
            .input_args([
                "-f".to_string(),
                "rawvideo".to_string(),
                "-pix_fmt".to_string(),
                "rgb24".to_string(),
                "-s".to_string(),
                format!("{}x{}", self.width, self.height),
                "-r".to_string(),
                self.fps.to_string(),
            ])
            .output_args(self.encoding.video_args())
            .output_arg("-an")
            .faststart()
    }
}

/// Render `image_path` into a silent clip at `output_path`.
pub async fn render_ken_burns(
    image_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    options: &KenBurnsOptions,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let image_path = image_path.as_ref().to_path_buf();
    if !image_path.exists() {
        return Err(MediaError::FileNotFound(image_path));
    }

    let source = tokio::task::spawn_blocking(move || image::open(&image_path).map(|img| img.to_rgb8()))
        .await
        .map_err(|e| MediaError::internal(format!("image decode task failed: {e}")))??;

    let geometry = PanGeometry::new(
        source.width(),
        source.height(),
        options.direction,
        options.visibility_ratio,
        options.duration,
    )?;
    let frame_count = geometry.frame_count(options.fps);

    info!(
        direction = %options.direction,
        source_width = source.width(),
        source_height = source.height(),
        frames = frame_count,
        "Rendering pan/zoom clip"
    );

    let (tx, rx) = mpsc::channel::<Vec<u8>>(FRAME_QUEUE_DEPTH);
    let (fps, width, height) = (options.fps, options.width, options.height);

    let producer = tokio::task::spawn_blocking(move || {
        let mut sent = 0usize;
        for frame in geometry.frames(&source, fps, width, height) {
            // Receiver gone means the encoder stopped; stop rendering.
            if tx.blocking_send(frame.into_raw()).is_err() {
                break;
            }
            sent += 1;
        }
        sent
    });

    let cmd = options.command(output_path);
    let total_ms = (options.duration * 1000.0) as i64;
    let result = runner
        .run_with_frames(&cmd, rx, move |progress| {
            debug!(
                percent = progress.percentage(total_ms),
                speed = progress.speed,
                "pan/zoom encode progress"
            );
        })
        .await;

    let sent = producer
        .await
        .map_err(|e| MediaError::internal(format!("frame renderer failed: {e}")))?;
    result?;

    if sent != frame_count {
        return Err(MediaError::internal(format!(
            "encoder accepted {sent} of {frame_count} frames"
        )));
    }
    Ok(())
}
