//! Object key layout and public URLs.
//!
//! Key space:
//! - `videos/{name}_{unix_ts}.mp4` for single published videos
//! - `projects/{project}/{kind}[_scene_NNN].{ext}` for batch items

use reel_models::{sanitize_component, ArtifactKind, ProjectId, SceneId};

use crate::error::{StorageError, StorageResult};

const VIDEO_PREFIX: &str = "videos";
const PROJECT_PREFIX: &str = "projects";

/// Key for a single published video.
pub fn video_key(name: &str, unix_ts: i64) -> String {
    format!("{}/{}_{}.mp4", VIDEO_PREFIX, sanitize_component(name), unix_ts)
}

/// Key for a rendered or merged scene clip.
pub fn scene_video_key(scene_id: &SceneId, merged: bool, unix_ts: i64) -> String {
    if merged {
        video_key(&format!("merged_{}", scene_id.as_str()), unix_ts)
    } else {
        video_key(scene_id.as_str(), unix_ts)
    }
}

/// Key for a project's concatenated video.
pub fn final_video_key(project_id: &ProjectId, unix_ts: i64) -> String {
    video_key(&format!("final_{}", project_id.as_str()), unix_ts)
}

/// Key for a load test output.
pub fn load_test_key(test_name: &str, unix_ts: i64) -> String {
    video_key(&format!("loadtest_{}", test_name), unix_ts)
}

/// Key for one batch item; depends only on the project, kind tag and scene.
pub fn batch_item_key(project_id: &ProjectId, kind: ArtifactKind, scene_number: Option<u32>) -> String {
    let project = sanitize_component(project_id.as_str());
    match scene_number {
        Some(n) => format!(
            "{}/{}/{}_scene_{:03}.{}",
            PROJECT_PREFIX,
            project,
            kind.as_str(),
            n,
            kind.extension()
        ),
        None => format!("{}/{}/{}.{}", PROJECT_PREFIX, project, kind.as_str(), kind.extension()),
    }
}

/// Join a public base URL and a key, percent-encoding each key segment.
pub fn public_url(base: &str, key: &str) -> StorageResult<String> {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return Err(StorageError::config_error("public base URL is empty"));
    }
    if key.is_empty() || key.starts_with('/') {
        return Err(StorageError::invalid_key(key.to_string()));
    }
    let encoded: Vec<String> = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    Ok(format!("{}/{}", base, encoded.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_keys() {
        assert_eq!(video_key("s1", 1700000000), "videos/s1_1700000000.mp4");
        assert_eq!(
            scene_video_key(&SceneId::new("s1"), true, 5),
            "videos/merged_s1_5.mp4"
        );
        assert_eq!(
            final_video_key(&ProjectId::new("p 9"), 5),
            "videos/final_p_9_5.mp4"
        );
        assert_eq!(load_test_key("gpu_test", 5), "videos/loadtest_gpu_test_5.mp4");
    }

    #[test]
    fn test_batch_item_key_is_pure() {
        let project = ProjectId::new("proj-1");
        let a = batch_item_key(&project, ArtifactKind::Audio, Some(3));
        let b = batch_item_key(&project, ArtifactKind::Audio, Some(3));
        assert_eq!(a, b);
        assert_eq!(a, "projects/proj-1/audio_scene_003.wav");
        assert_eq!(
            batch_item_key(&project, ArtifactKind::FinalVideo, None),
            "projects/proj-1/final_video.mp4"
        );
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("https://cdn.example.com/", "videos/a b.mp4").unwrap(),
            "https://cdn.example.com/videos/a%20b.mp4"
        );
        assert!(public_url("", "videos/a.mp4").is_err());
        assert!(public_url("https://cdn.example.com", "").is_err());
    }
}
