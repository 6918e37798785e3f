//! Working directory management.
//!
//! Project directories live under a deterministic key space so every scene
//! of a project lands in the same place; units without a project get an
//! ephemeral directory that is removed as soon as the unit finishes.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use reel_models::{sanitize_component, ProjectId};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// A directory a unit writes its intermediates into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    path: PathBuf,
    project_id: Option<ProjectId>,
}

impl WorkDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn project_id(&self) -> Option<&ProjectId> {
        self.project_id.as_ref()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.project_id.is_none()
    }

    /// Path of a named artifact inside this directory.
    ///
    /// Names must be a single path component.
    pub fn file(&self, name: &str) -> WorkerResult<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => Ok(self.path.join(name)),
            _ => Err(WorkerError::validation(format!(
                "artifact name must be a plain file name, got {name:?}"
            ))),
        }
    }
}

/// Creates, reuses and removes unit working directories.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    projects_root: PathBuf,
    scratch_root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            projects_root: config.projects_dir(),
            scratch_root: config.scratch_dir(),
        }
    }

    /// Directory a project's artifacts accumulate in.
    pub fn project_path(&self, project_id: &ProjectId) -> PathBuf {
        self.projects_root.join(sanitize_component(project_id.as_str()))
    }

    /// Project directory when `project_id` is given (created if needed, reused
    /// otherwise), else a fresh ephemeral directory.
    pub async fn get_or_create(&self, project_id: Option<&ProjectId>) -> WorkerResult<WorkDir> {
        match project_id {
            Some(id) => {
                let path = self.project_path(id);
                // create_dir_all tolerates concurrent creators
                tokio::fs::create_dir_all(&path).await?;
                debug!(project_id = %id, path = %path.display(), "Using project directory");
                Ok(WorkDir {
                    path,
                    project_id: Some(id.clone()),
                })
            }
            None => {
                tokio::fs::create_dir_all(&self.scratch_root).await?;
                let path = self
                    .scratch_root
                    .join(format!("unit_{}", Uuid::new_v4().simple()));
                tokio::fs::create_dir(&path).await?;
                debug!(path = %path.display(), "Created ephemeral directory");
                Ok(WorkDir {
                    path,
                    project_id: None,
                })
            }
        }
    }

    /// Remove `dir` if it is ephemeral. Project directories are left for
    /// later stages and removed only by [`Self::cleanup_project`].
    pub async fn teardown(&self, dir: &WorkDir) -> WorkerResult<()> {
        if !dir.is_ephemeral() {
            return Ok(());
        }
        match tokio::fs::remove_dir_all(&dir.path).await {
            Ok(()) => {
                debug!(path = %dir.path.display(), "Removed ephemeral directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Teardown that only logs failures; used on unit exit paths.
    pub async fn teardown_quietly(&self, dir: &WorkDir) {
        if let Err(e) = self.teardown(dir).await {
            warn!(path = %dir.path.display(), "Failed to remove ephemeral directory: {}", e);
        }
    }

    /// Remove a project directory. Returns whether anything was removed.
    pub async fn cleanup_project(&self, project_id: &ProjectId) -> WorkerResult<bool> {
        let path = self.project_path(project_id);
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {
                info!(project_id = %project_id, "Removed project directory");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn manager(root: &TempDir) -> WorkspaceManager {
        WorkspaceManager::new(&WorkerConfig::rooted_at(root.path()))
    }

    #[tokio::test]
    async fn test_project_dir_is_shared_between_concurrent_scenes() {
        let root = TempDir::new().unwrap();
        let manager = Arc::new(manager(&root));
        let project = ProjectId::new("proj-1");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let project = project.clone();
            handles.push(tokio::spawn(async move {
                manager.get_or_create(Some(&project)).await.unwrap()
            }));
        }
        let mut paths = Vec::new();
        for handle in handles {
            paths.push(handle.await.unwrap().path().to_path_buf());
        }

        assert!(paths.iter().all(|p| p == &paths[0]));
        assert!(paths[0].is_dir());
        assert_eq!(paths[0], root.path().join("projects").join("proj-1"));
    }

    #[tokio::test]
    async fn test_project_ids_are_sanitized() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let dir = manager
            .get_or_create(Some(&ProjectId::new("../escape")))
            .await
            .unwrap();
        assert!(dir.path().starts_with(root.path().join("projects")));
    }

    #[tokio::test]
    async fn test_ephemeral_dirs_are_unique_and_removed() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);

        let a = manager.get_or_create(None).await.unwrap();
        let b = manager.get_or_create(None).await.unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.is_ephemeral());

        tokio::fs::write(a.file("x.mp4").unwrap(), b"x").await.unwrap();
        manager.teardown(&a).await.unwrap();
        assert!(!a.path().exists());
        assert!(b.path().exists());

        // second teardown is a no-op
        manager.teardown(&a).await.unwrap();
    }

    #[tokio::test]
    async fn test_teardown_keeps_project_dir() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let project = ProjectId::new("keep");
        let dir = manager.get_or_create(Some(&project)).await.unwrap();

        manager.teardown(&dir).await.unwrap();
        assert!(dir.path().exists());

        assert!(manager.cleanup_project(&project).await.unwrap());
        assert!(!dir.path().exists());
        assert!(!manager.cleanup_project(&project).await.unwrap());
    }

    #[test]
    fn test_file_rejects_nested_names() {
        let dir = WorkDir {
            path: PathBuf::from("/tmp/reel/projects/p"),
            project_id: None,
        };
        assert!(dir.file("video_scene_001.mp4").is_ok());
        assert!(dir.file("../outside.mp4").is_err());
        assert!(dir.file("a/b.mp4").is_err());
        assert!(dir.file("").is_err());
    }
}
