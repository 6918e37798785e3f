//! Stage timing log.
//!
//! Every stage attempt appends one JSON line to a shared file. Concurrent
//! units serialize their appends through a single lock, and each line is
//! written with one `write_all` on an append-mode handle, so records never
//! interleave. Aggregate views are computed by re-reading the file.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use reel_models::{TimingEvent, TimingStatus, TimingTags};

use crate::error::{WorkerError, WorkerResult};

/// Grouping key for records without a scene tag.
pub const GENERAL_GROUP: &str = "general";

/// Wall-clock start of a stage.
#[derive(Debug, Clone, Copy)]
pub struct StageClock {
    started_at: DateTime<Utc>,
    instant: Instant,
}

impl StageClock {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            instant: Instant::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.instant.elapsed().as_secs_f64() * 1000.0
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.instant.elapsed().as_secs_f64()
    }
}

/// Append-only NDJSON log of stage timings.
#[derive(Debug)]
pub struct TimingLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TimingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line.
    pub async fn append(&self, event: &TimingEvent) -> WorkerResult<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Record a finished stage. Failures to write are logged, never raised.
    pub async fn record(
        &self,
        operation: &str,
        tags: &TimingTags,
        clock: &StageClock,
        error: Option<&str>,
    ) {
        let duration_ms = clock.elapsed_ms();
        let status = if error.is_some() {
            TimingStatus::Error
        } else {
            TimingStatus::Success
        };

        metrics::counter!(
            "reel_stage_total",
            "operation" => operation.to_string(),
            "status" => status.as_str()
        )
        .increment(1);
        metrics::histogram!("reel_stage_duration_ms", "operation" => operation.to_string())
            .record(duration_ms);

        let mut event = TimingEvent::new(operation, clock.started_at(), duration_ms, status)
            .with_tags(tags.clone());
        if let Some(error) = error {
            event = event.with_error(error);
        }
        if let Err(e) = self.append(&event).await {
            warn!(operation, path = %self.path.display(), "Failed to append timing record: {}", e);
        }
    }

    /// Run `fut` as the stage `operation` and record its outcome.
    pub async fn measure<T, E, F>(&self, operation: &str, tags: &TimingTags, fut: F) -> WorkerResult<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<WorkerError>,
    {
        let clock = StageClock::start();
        let result = fut.await.map_err(Into::into);
        let error = result.as_ref().err().map(|e| e.to_string());
        self.record(operation, tags, &clock, error.as_deref()).await;
        result
    }

    /// All well-formed records in file order. Malformed lines are skipped.
    pub async fn events(&self) -> WorkerResult<Vec<TimingEvent>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        let mut skipped = 0usize;
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<TimingEvent>(line) {
                Ok(event) => events.push(event),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, path = %self.path.display(), "Skipped malformed timing records");
        }
        Ok(events)
    }

    /// Per-operation statistics.
    pub async fn summary(&self) -> WorkerResult<BTreeMap<String, OperationStats>> {
        Ok(summarize(&self.events().await?))
    }

    /// Per-project breakdown, optionally restricted to one project.
    pub async fn project_breakdown(
        &self,
        project_id: Option<&str>,
    ) -> WorkerResult<BTreeMap<String, ProjectTimings>> {
        Ok(breakdown(&self.events().await?, project_id))
    }

    /// Truncate the log.
    pub async fn clear(&self) -> WorkerResult<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::File::create(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Aggregate statistics for one operation name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationStats {
    pub count: usize,
    pub total_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
}

impl OperationStats {
    fn first(duration_ms: f64) -> Self {
        Self {
            count: 1,
            total_ms: duration_ms,
            min_ms: duration_ms,
            max_ms: duration_ms,
            avg_ms: duration_ms,
        }
    }

    fn add(&mut self, duration_ms: f64) {
        self.count += 1;
        self.total_ms += duration_ms;
        self.min_ms = self.min_ms.min(duration_ms);
        self.max_ms = self.max_ms.max(duration_ms);
        self.avg_ms = self.total_ms / self.count as f64;
    }
}

/// One stage entry inside a project breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageEntry {
    pub operation: String,
    pub duration_ms: f64,
    pub status: TimingStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupTimings {
    pub total_ms: f64,
    pub stages: Vec<StageEntry>,
}

/// Timings of one project, grouped by scene (or [`GENERAL_GROUP`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectTimings {
    pub total_ms: f64,
    pub groups: BTreeMap<String, GroupTimings>,
}

pub fn summarize(events: &[TimingEvent]) -> BTreeMap<String, OperationStats> {
    let mut stats: BTreeMap<String, OperationStats> = BTreeMap::new();
    for event in events {
        match stats.get_mut(&event.operation) {
            Some(entry) => entry.add(event.duration_ms),
            None => {
                stats.insert(event.operation.clone(), OperationStats::first(event.duration_ms));
            }
        }
    }
    stats
}

/// Group tagged records by project, then by scene. Untagged records are
/// left out.
pub fn breakdown(events: &[TimingEvent], project_id: Option<&str>) -> BTreeMap<String, ProjectTimings> {
    let mut projects: BTreeMap<String, ProjectTimings> = BTreeMap::new();
    for event in events {
        let Some(project) = event.project_id() else {
            continue;
        };
        if project_id.is_some_and(|wanted| wanted != project) {
            continue;
        }

        let project = projects.entry(project.to_string()).or_default();
        project.total_ms += event.duration_ms;

        let group_key = event.scene_key().unwrap_or_else(|| GENERAL_GROUP.to_string());
        let group = project.groups.entry(group_key).or_default();
        group.total_ms += event.duration_ms;
        group.stages.push(StageEntry {
            operation: event.operation.clone(),
            duration_ms: event.duration_ms,
            status: event.status,
        });
    }
    projects
}
