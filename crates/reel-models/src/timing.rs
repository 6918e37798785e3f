//! Timing log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Tag key grouping records by project.
pub const PROJECT_TAG: &str = "project_id";
/// Tag key grouping records by scene within a project.
pub const SCENE_TAG: &str = "scene";

/// Free-form structured tags attached to a record.
pub type TimingTags = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingStatus {
    Success,
    Error,
}

impl TimingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// One completed stage attempt. Serialized as a single NDJSON line with the
/// tags flattened next to the fixed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingEvent {
    #[serde(alias = "timestamp")]
    pub start: DateTime<Utc>,
    pub operation: String,
    pub duration_ms: f64,
    pub status: TimingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub tags: TimingTags,
}

impl TimingEvent {
    pub fn new(
        operation: impl Into<String>,
        start: DateTime<Utc>,
        duration_ms: f64,
        status: TimingStatus,
    ) -> Self {
        Self {
            start,
            operation: operation.into(),
            duration_ms,
            status,
            error: None,
            tags: TimingTags::new(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_tags(mut self, tags: TimingTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn project_id(&self) -> Option<&str> {
        self.tags.get(PROJECT_TAG).and_then(Value::as_str)
    }

    /// Scene grouping key, accepting numeric or string scene tags.
    pub fn scene_key(&self) -> Option<String> {
        match self.tags.get(SCENE_TAG)? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}
