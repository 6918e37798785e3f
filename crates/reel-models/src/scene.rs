//! Scenes, identifiers and pan directions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::locator::Locator;
use crate::subtitle::SubtitleCue;
use crate::utils::sanitize_component;

/// Default scene length in seconds when a request omits it.
pub const DEFAULT_SCENE_DURATION: f64 = 10.0;

/// Identifier of one scene request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tag used to qualify file names inside a shared working directory.
    ///
    /// Prefers the scene number (`scene_007`) so that concurrent scenes of one
    /// project never collide; falls back to the sanitized scene id.
    pub fn file_tag(&self, scene_number: Option<u32>) -> String {
        match scene_number {
            Some(n) => format!("scene_{:03}", n),
            None => sanitize_component(&self.0),
        }
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a multi-scene project sharing one working directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of the simulated camera move.
///
/// Parsing never fails: unknown names map to [`PanDirection::Static`], a
/// centered crop without motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PanDirection {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    #[default]
    BottomToTop,
    Static,
}

impl PanDirection {
    /// Parse a direction name, accepting the request aliases
    /// `horizontal`, `vertical` and `vertical_reverse`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left_to_right" | "horizontal" => Self::LeftToRight,
            "right_to_left" => Self::RightToLeft,
            "top_to_bottom" | "vertical_reverse" => Self::TopToBottom,
            "bottom_to_top" | "vertical" => Self::BottomToTop,
            _ => Self::Static,
        }
    }

    /// Alternating vertical motion keyed on scene parity: odd scenes rise,
    /// even scenes descend.
    pub fn for_scene_number(scene_number: u32) -> Self {
        if scene_number % 2 == 1 {
            Self::BottomToTop
        } else {
            Self::TopToBottom
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftToRight => "left_to_right",
            Self::RightToLeft => "right_to_left",
            Self::TopToBottom => "top_to_bottom",
            Self::BottomToTop => "bottom_to_top",
            Self::Static => "static",
        }
    }

    /// Whether the crop travels along the x axis.
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::LeftToRight | Self::RightToLeft)
    }

    /// Whether the offset runs from its maximum back to zero.
    pub fn is_reverse(&self) -> bool {
        matches!(self, Self::RightToLeft | Self::BottomToTop)
    }
}

impl From<String> for PanDirection {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<PanDirection> for String {
    fn from(value: PanDirection) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_scene_duration() -> f64 {
    DEFAULT_SCENE_DURATION
}

/// One narrated visual unit: a still image animated into a clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub scene_id: SceneId,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub scene_number: Option<u32>,
    /// Still image to animate.
    #[serde(alias = "image_url")]
    pub source: Locator,
    /// Clip length in seconds.
    #[serde(default = "default_scene_duration")]
    pub duration: f64,
    /// Explicit camera move; see [`Scene::pan`] for the fallback.
    #[serde(default)]
    pub pan_direction: Option<PanDirection>,
    /// Fixed captions, ordered by start.
    #[serde(default)]
    pub subtitles: Vec<SubtitleCue>,
    /// Keep the result local instead of publishing it.
    #[serde(default)]
    pub skip_publish: bool,
    #[serde(default)]
    pub callback_url: Option<String>,
}

impl Scene {
    pub fn new(scene_id: impl Into<String>, source: Locator, duration: f64) -> Self {
        Self {
            scene_id: SceneId::new(scene_id),
            project_id: None,
            scene_number: None,
            source,
            duration,
            pan_direction: None,
            subtitles: Vec::new(),
            skip_publish: false,
            callback_url: None,
        }
    }

    pub fn with_project(mut self, project_id: ProjectId, scene_number: u32) -> Self {
        self.project_id = Some(project_id);
        self.scene_number = Some(scene_number);
        self
    }

    pub fn with_pan(mut self, direction: PanDirection) -> Self {
        self.pan_direction = Some(direction);
        self
    }

    /// Reject structurally invalid scenes before any stage runs.
    pub fn validate(&self) -> ModelResult<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ModelError::validation(format!(
                "scene duration must be positive, got {}",
                self.duration
            )));
        }
        Ok(())
    }

    pub fn file_tag(&self) -> String {
        self.scene_id.file_tag(self.scene_number)
    }

    /// Pan direction to render: the explicit one, else alternating by scene
    /// number, else the default vertical move.
    pub fn pan(&self) -> PanDirection {
        match (self.pan_direction, self.scene_number) {
            (Some(direction), _) => direction,
            (None, Some(n)) => PanDirection::for_scene_number(n),
            (None, None) => PanDirection::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_aliases() {
        assert_eq!(PanDirection::parse("horizontal"), PanDirection::LeftToRight);
        assert_eq!(PanDirection::parse("vertical"), PanDirection::BottomToTop);
        assert_eq!(
            PanDirection::parse("vertical_reverse"),
            PanDirection::TopToBottom
        );
        assert_eq!(PanDirection::parse("Right_To_Left"), PanDirection::RightToLeft);
    }

    #[test]
    fn test_unknown_pan_is_static() {
        assert_eq!(PanDirection::parse("diagonal"), PanDirection::Static);
        assert_eq!(PanDirection::parse(""), PanDirection::Static);
    }

    #[test]
    fn test_pan_parity() {
        assert_eq!(PanDirection::for_scene_number(1), PanDirection::parse("vertical"));
        assert_eq!(
            PanDirection::for_scene_number(2),
            PanDirection::parse("vertical_reverse")
        );
        assert_eq!(PanDirection::for_scene_number(3), PanDirection::BottomToTop);
    }

    #[test]
    fn test_scene_pan_fallback() {
        let source = Locator::parse("/tmp/reel/a.png").unwrap();
        let scene = Scene::new("s1", source, 5.0);
        assert_eq!(scene.pan(), PanDirection::BottomToTop);

        let second = scene.clone().with_project(ProjectId::new("p1"), 2);
        assert_eq!(second.pan(), PanDirection::TopToBottom);

        let explicit = second.with_pan(PanDirection::RightToLeft);
        assert_eq!(explicit.pan(), PanDirection::RightToLeft);
    }

    #[test]
    fn test_file_tag() {
        let id = SceneId::new("scene/abc");
        assert_eq!(id.file_tag(Some(7)), "scene_007");
        assert_eq!(id.file_tag(None), "scene_abc");
    }

    #[test]
    fn test_scene_from_request_json() {
        let json = r#"{
            "scene_id": "s1",
            "project_id": "p1",
            "scene_number": 3,
            "image_url": "https://example.com/s1.png",
            "pan_direction": "horizontal"
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.duration, DEFAULT_SCENE_DURATION);
        assert_eq!(scene.pan(), PanDirection::LeftToRight);
        assert!(scene.source.is_remote());
        assert!(scene.subtitles.is_empty());
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_scene_rejects_bad_locator() {
        let json = r#"{"scene_id": "s1", "source": "https://"}"#;
        assert!(serde_json::from_str::<Scene>(json).is_err());
    }

    #[test]
    fn test_non_positive_duration_invalid() {
        let scene = Scene::new("s", Locator::parse("/tmp/a.png").unwrap(), 0.0);
        assert!(scene.validate().is_err());
        let scene = Scene::new("s", Locator::parse("/tmp/a.png").unwrap(), f64::NAN);
        assert!(scene.validate().is_err());
    }
}
