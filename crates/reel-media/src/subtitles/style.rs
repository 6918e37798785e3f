//! Style descriptors for subtitle runs and script headers.

use serde::{Deserialize, Serialize};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// How one run of text is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStyle {
    pub color: Rgb,
    pub outline_color: Rgb,
    /// Outline thickness in script pixels.
    pub outline_width: f32,
    /// Edge blur strength.
    pub blur: f32,
    /// 1.0 is fully opaque, 0.0 invisible.
    pub opacity: f32,
}

impl RunStyle {
    /// Flat white text without outline.
    pub const fn plain() -> Self {
        Self {
            color: Rgb::WHITE,
            outline_color: Rgb::BLACK,
            outline_width: 0.0,
            blur: 0.0,
            opacity: 1.0,
        }
    }

    /// Heavy black outline with a soft edge, used for the spoken word.
    pub const fn highlight() -> Self {
        Self {
            color: Rgb::WHITE,
            outline_color: Rgb::BLACK,
            outline_width: 15.0,
            blur: 5.0,
            opacity: 1.0,
        }
    }

    /// White text with a thin black stroke for fixed captions.
    pub const fn caption() -> Self {
        Self {
            color: Rgb::WHITE,
            outline_color: Rgb::BLACK,
            outline_width: 2.0,
            blur: 0.0,
            opacity: 1.0,
        }
    }
}

/// Where events are anchored on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    BottomLeft,
    BottomCenter,
    BottomRight,
    MiddleCenter,
    TopCenter,
}

/// Canvas and base typography shared by every event in a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptHeader {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub font: String,
    pub font_size: u32,
    pub bold: bool,
    pub primary: Rgb,
    /// Karaoke fill color in renderers that support it.
    pub secondary: Rgb,
    pub outline: Rgb,
    pub shadow: Rgb,
    /// Opacity of the shadow/box color.
    pub shadow_opacity: f32,
    pub outline_width: f32,
    pub anchor: Anchor,
    pub margin_h: u32,
    pub margin_v: u32,
}

impl ScriptHeader {
    /// Header for word-highlight captions on a `width`×`height` canvas.
    pub fn karaoke(width: u32, height: u32, font_size: u32) -> Self {
        Self {
            title: "Karaoke Subtitles".to_string(),
            width,
            height,
            font: "Arial".to_string(),
            font_size,
            bold: true,
            primary: Rgb::WHITE,
            secondary: Rgb::YELLOW,
            outline: Rgb::BLACK,
            shadow: Rgb::BLACK,
            shadow_opacity: 0.5,
            outline_width: 0.0,
            anchor: Anchor::BottomCenter,
            margin_h: 10,
            margin_v: 200,
        }
    }

    /// Header for fixed captions: size 45, anchored 150px above the bottom.
    pub fn captions(width: u32, height: u32) -> Self {
        Self {
            title: "Captions".to_string(),
            font_size: 45,
            bold: false,
            outline_width: 2.0,
            margin_v: 150,
            ..Self::karaoke(width, height, 45)
        }
    }
}
