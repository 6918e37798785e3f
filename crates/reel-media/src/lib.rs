//! Media processing for narrated reels.
//!
//! This crate provides:
//! - Pan/zoom frame geometry and clip rendering
//! - Subtitle layout (fixed captions and karaoke) with an ASS renderer
//! - FFmpeg command building and execution with timeouts
//! - FFprobe-based media inspection
//! - Concatenation, muxing and load-test loop planning

pub mod command;
pub mod concat;
pub mod error;
pub mod fs_utils;
pub mod geometry;
pub mod kenburns;
pub mod looping;
pub mod mux;
pub mod probe;
pub mod progress;
pub mod subtitles;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{concat_list, concat_reencode, concat_stream_copy, ConcatEntry};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{move_file, partial_path, remove_file_if_exists};
pub use geometry::{render_crop, CropRect, PanGeometry};
pub use kenburns::{render_ken_burns, KenBurnsOptions};
pub use looping::{plan_loop, LoopPlan, PlannedSegment};
pub use mux::{mux_audio, mux_bound};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
