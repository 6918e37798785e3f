//! Still image → pan/zoom clip, with optional fixed captions.

use tracing::Instrument;

use reel_media::subtitles::{burn_subtitles, caption_script, RunStyle, ScriptHeader};
use reel_media::{render_ken_burns, KenBurnsOptions};
use reel_models::encoding::{OUTPUT_HEIGHT, OUTPUT_WIDTH};
use reel_models::{Artifact, ArtifactKind, Scene, TimingTags, UnitResult};
use reel_storage::keys::scene_video_key;

use super::{extension_or, publish_timestamp, stages, unit_tags, Orchestrator};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::UnitLogger;
use crate::timing::StageClock;
use crate::workspace::WorkDir;

impl Orchestrator {
    /// Animate `scene.source` into a clip of `scene.duration` seconds.
    ///
    /// Captions are drawn when `scene.subtitles` is non-empty. The clip is
    /// published unless `skip_publish` is set, in which case it stays in the
    /// project directory for a later merge.
    pub async fn image_to_video(&self, scene: &Scene) -> UnitResult {
        let logger = UnitLogger::new(scene.scene_id.as_str(), stages::IMAGE_TO_VIDEO);
        let tags = unit_tags(scene.project_id.as_ref(), scene.scene_number);
        let clock = StageClock::start();

        let result = self
            .run_image_to_video(scene, &tags, &logger)
            .instrument(logger.create_span())
            .await;

        self.finish_unit(
            scene.scene_id.as_str(),
            stages::IMAGE_TO_VIDEO,
            &tags,
            &clock,
            &logger,
            result,
        )
        .await
    }

    async fn run_image_to_video(
        &self,
        scene: &Scene,
        tags: &TimingTags,
        logger: &UnitLogger,
    ) -> WorkerResult<UnitResult> {
        scene.validate()?;
        if scene.skip_publish && scene.project_id.is_none() {
            return Err(WorkerError::validation(
                "skip_publish requires a project_id to keep the clip in",
            ));
        }
        logger.log_start(&format!(
            "{} pan over {:.2}s from {}",
            scene.pan(), scene.duration, scene.source
        ));

        let dir = self.workspace.get_or_create(scene.project_id.as_ref()).await?;
        let result = self.render_scene(scene, &dir, tags, logger).await;
        self.teardown(&dir).await;
        result
    }

    async fn render_scene(
        &self,
        scene: &Scene,
        dir: &WorkDir,
        tags: &TimingTags,
        logger: &UnitLogger,
    ) -> WorkerResult<UnitResult> {
        let tag = scene.file_tag();
        let image_name = format!("image_{}.{}", tag, extension_or(scene.source.extension(), "jpg"));

        let image = self
            .timing
            .measure(
                stages::IMAGE_RESOLVE,
                tags,
                self.resolver.resolve(
                    &scene.source,
                    dir,
                    &image_name,
                    self.config.image_fetch_timeout,
                ),
            )
            .await?;

        let silent = dir.file(&format!("video_{tag}.mp4"))?;
        let options = KenBurnsOptions::new(scene.pan(), scene.duration)
            .with_visibility_ratio(self.config.visibility_ratio)
            .with_fps(self.config.fps);
        self.timing
            .measure(
                stages::KEN_BURNS_RENDER,
                tags,
                render_ken_burns(&image, &silent, &options, &self.runner),
            )
            .await?;
        logger.log_progress("pan/zoom clip rendered");

        let mut artifact =
            Artifact::new(silent, ArtifactKind::SilentVideo).with_duration(scene.duration);

        if !scene.subtitles.is_empty() {
            let subtitled = dir.file(&format!("video_subtitled_{tag}.mp4"))?;
            let script = caption_script(
                ScriptHeader::captions(OUTPUT_WIDTH, OUTPUT_HEIGHT),
                &scene.subtitles,
                RunStyle::caption(),
            );
            self.timing
                .measure(
                    stages::CAPTION_OVERLAY,
                    tags,
                    burn_subtitles(
                        artifact.path(),
                        &script,
                        dir.file(&format!("captions_{tag}.ass"))?,
                        &subtitled,
                        &self.encoding,
                        &self.runner,
                    ),
                )
                .await?;
            logger.log_progress(&format!("{} captions drawn", script.events.len()));
            artifact = Artifact::new(subtitled, ArtifactKind::SubtitledVideo)
                .with_duration(scene.duration);
        }

        let key = scene_video_key(&scene.scene_id, false, publish_timestamp());
        self.deliver(
            scene.scene_id.as_str(),
            artifact,
            &key,
            scene.skip_publish,
            stages::SCENE_PUBLISH,
            tags,
        )
        .await
    }
}
