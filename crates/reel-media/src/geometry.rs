//! Pan/zoom frame geometry.
//!
//! Everything here is pure: a [`PanGeometry`] is derived from the image size
//! and the motion parameters, and maps a query time to a crop window. Frames
//! are produced by cropping at fractional coordinates and resampling with a
//! Lanczos-3 kernel, so sub-pixel offsets survive into the output and the
//! motion stays smooth even when the per-frame travel is below one pixel.

use image::RgbImage;
use reel_models::PanDirection;
use std::f64::consts::PI;

use crate::error::{MediaError, MediaResult};

/// Kernel half-width in source pixels at unit scale.
const LANCZOS_LOBES: f64 = 3.0;

/// Axis-aligned crop window in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the window lies inside a `width`×`height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        const EPS: f64 = 1e-9;
        self.x >= -EPS
            && self.y >= -EPS
            && self.right() <= width as f64 + EPS
            && self.bottom() <= height as f64 + EPS
    }
}

/// Crop window trajectory for one image and one camera move.
#[derive(Debug, Clone, PartialEq)]
pub struct PanGeometry {
    source_width: u32,
    source_height: u32,
    crop_width: f64,
    crop_height: f64,
    max_offset: f64,
    direction: PanDirection,
    duration: f64,
}

impl PanGeometry {
    /// Fix the crop size and travel for an image.
    ///
    /// Horizontal pans keep the full height and `width * ratio`; every other
    /// direction (including the static fallback) keeps the full width and
    /// `height * ratio`.
    pub fn new(
        source_width: u32,
        source_height: u32,
        direction: PanDirection,
        visibility_ratio: f64,
        duration: f64,
    ) -> MediaResult<Self> {
        if source_width == 0 || source_height == 0 {
            return Err(MediaError::invalid_input("image has zero size"));
        }
        if !(visibility_ratio > 0.0 && visibility_ratio <= 1.0) {
            return Err(MediaError::invalid_input(format!(
                "visibility ratio must be in (0, 1], got {visibility_ratio}"
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(MediaError::invalid_input(format!(
                "duration must be positive, got {duration}"
            )));
        }

        let (w, h) = (source_width as f64, source_height as f64);
        let (crop_width, crop_height, max_offset) = if direction.is_horizontal() {
            let cw = w * visibility_ratio;
            (cw, h, w - cw)
        } else {
            let ch = h * visibility_ratio;
            (w, ch, h - ch)
        };

        Ok(Self {
            source_width,
            source_height,
            crop_width,
            crop_height,
            max_offset,
            direction,
            duration,
        })
    }

    pub fn direction(&self) -> PanDirection {
        self.direction
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Linear progress through the move, clamped to [0, 1].
    pub fn progress(&self, t: f64) -> f64 {
        (t / self.duration).clamp(0.0, 1.0)
    }

    /// Offset along the pan axis at time `t`.
    fn offset_at(&self, t: f64) -> f64 {
        let p = self.progress(t);
        match self.direction {
            PanDirection::Static => self.max_offset / 2.0,
            d if d.is_reverse() => self.max_offset * (1.0 - p),
            _ => self.max_offset * p,
        }
    }

    /// Crop window at time `t`.
    pub fn crop_at(&self, t: f64) -> CropRect {
        let offset = self.offset_at(t).clamp(0.0, self.max_offset);
        let (x, y) = if self.direction.is_horizontal() {
            (offset, 0.0)
        } else {
            (0.0, offset)
        };
        CropRect {
            x,
            y,
            width: self.crop_width,
            height: self.crop_height,
        }
    }

    /// Number of frames covering [0, duration) at `fps`.
    pub fn frame_count(&self, fps: u32) -> usize {
        let exact = self.duration * fps as f64;
        // Absorb float noise so 10s at 30fps is 300 frames, not 301.
        ((exact - 1e-6).ceil().max(1.0)) as usize
    }

    /// Query times, one per frame interval.
    pub fn frame_times(&self, fps: u32) -> FrameTimes {
        FrameTimes {
            next: 0,
            count: self.frame_count(fps),
            fps: fps.max(1),
        }
    }

    /// Lazy frame sequence over `source`.
    ///
    /// Each call starts a fresh pass; the iterator holds no state beyond its
    /// position, so it can be cloned or re-created at will.
    pub fn frames<'a>(
        &'a self,
        source: &'a RgbImage,
        fps: u32,
        out_width: u32,
        out_height: u32,
    ) -> PanFrames<'a> {
        PanFrames {
            geometry: self,
            source,
            times: self.frame_times(fps),
            out_width,
            out_height,
        }
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }
}

/// Frame timestamps `i / fps` for `i` in `0..count`.
#[derive(Debug, Clone)]
pub struct FrameTimes {
    next: usize,
    count: usize,
    fps: u32,
}

impl Iterator for FrameTimes {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.count {
            return None;
        }
        let t = self.next as f64 / self.fps as f64;
        self.next += 1;
        Some(t)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for FrameTimes {}

/// Rendered frames of a pan, produced on demand.
#[derive(Debug, Clone)]
pub struct PanFrames<'a> {
    geometry: &'a PanGeometry,
    source: &'a RgbImage,
    times: FrameTimes,
    out_width: u32,
    out_height: u32,
}

impl Iterator for PanFrames<'_> {
    type Item = RgbImage;

    fn next(&mut self) -> Option<RgbImage> {
        let t = self.times.next()?;
        let rect = self.geometry.crop_at(t);
        Some(render_crop(self.source, &rect, self.out_width, self.out_height))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.times.size_hint()
    }
}

impl ExactSizeIterator for PanFrames<'_> {}

/// Crop `source` to `rect` (fractional coordinates allowed) and resample the
/// window to exactly `out_width`×`out_height` with a Lanczos-3 filter.
pub fn render_crop(source: &RgbImage, rect: &CropRect, out_width: u32, out_height: u32) -> RgbImage {
    let out_width = out_width.max(1);
    let out_height = out_height.max(1);

    let cols = axis_taps(rect.x, rect.width, source.width(), out_width);
    let rows = axis_taps(rect.y, rect.height, source.height(), out_height);

    // Only the source rows touched by the vertical taps need a horizontal pass.
    let row_lo = rows.iter().map(|t| t.start).min().unwrap_or(0);
    let row_hi = rows
        .iter()
        .map(|t| t.start + t.weights.len())
        .max()
        .unwrap_or(0);

    let ow = out_width as usize;
    let mut horizontal = vec![0f32; (row_hi - row_lo) * ow * 3];
    let raw = source.as_raw();
    let stride = source.width() as usize * 3;

    for sy in row_lo..row_hi {
        let src_row = &raw[sy * stride..(sy + 1) * stride];
        let dst_row = &mut horizontal[(sy - row_lo) * ow * 3..(sy - row_lo + 1) * ow * 3];
        for (ox, tap) in cols.iter().enumerate() {
            let mut acc = [0f32; 3];
            for (k, w) in tap.weights.iter().enumerate() {
                let px = (tap.start + k) * 3;
                acc[0] += src_row[px] as f32 * w;
                acc[1] += src_row[px + 1] as f32 * w;
                acc[2] += src_row[px + 2] as f32 * w;
            }
            dst_row[ox * 3..ox * 3 + 3].copy_from_slice(&acc);
        }
    }

    let mut out = RgbImage::new(out_width, out_height);
    for (oy, tap) in rows.iter().enumerate() {
        for ox in 0..ow {
            let mut acc = [0f32; 3];
            for (k, w) in tap.weights.iter().enumerate() {
                let base = ((tap.start + k - row_lo) * ow + ox) * 3;
                acc[0] += horizontal[base] * w;
                acc[1] += horizontal[base + 1] * w;
                acc[2] += horizontal[base + 2] * w;
            }
            out.put_pixel(
                ox as u32,
                oy as u32,
                image::Rgb([clamp_u8(acc[0]), clamp_u8(acc[1]), clamp_u8(acc[2])]),
            );
        }
    }

    out
}

/// Contributing source pixels for one output pixel along one axis.
#[derive(Debug, Clone)]
struct Taps {
    start: usize,
    weights: Vec<f32>,
}

fn axis_taps(origin: f64, span: f64, source_len: u32, out_len: u32) -> Vec<Taps> {
    let source_len = source_len.max(1) as usize;
    let scale = span / out_len as f64;
    // Widen the kernel when downsampling so it also low-passes.
    let filter_scale = scale.max(1.0);
    let support = LANCZOS_LOBES * filter_scale;

    (0..out_len)
        .map(|o| {
            let center = origin + (o as f64 + 0.5) * scale;
            let mut lo = (center - support).floor().max(0.0) as usize;
            let mut hi = ((center + support).ceil().max(0.0) as usize).min(source_len);
            if hi <= lo {
                lo = (center.floor().max(0.0) as usize).min(source_len - 1);
                hi = lo + 1;
            }

            let mut weights: Vec<f64> = (lo..hi)
                .map(|i| lanczos((i as f64 + 0.5 - center) / filter_scale))
                .collect();
            let sum: f64 = weights.iter().sum();
            if sum.abs() < 1e-12 {
                // Degenerate window: take the nearest pixel.
                let nearest = (center.floor().max(0.0) as usize).clamp(lo, hi - 1);
                weights.iter_mut().for_each(|w| *w = 0.0);
                weights[nearest - lo] = 1.0;
            } else {
                weights.iter_mut().for_each(|w| *w /= sum);
            }

            Taps {
                start: lo,
                weights: weights.into_iter().map(|w| w as f32).collect(),
            }
        })
        .collect()
}

fn lanczos(x: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    if x.abs() >= LANCZOS_LOBES {
        return 0.0;
    }
    let px = PI * x;
    LANCZOS_LOBES * px.sin() * (px / LANCZOS_LOBES).sin() / (px * px)
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
