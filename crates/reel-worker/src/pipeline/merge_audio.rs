//! Clip + narration → merged clip, with optional karaoke captions.

use tracing::Instrument;

use reel_media::subtitles::{burn_subtitles, KaraokeLayout, ScriptHeader, SubtitleScript};
use reel_media::{mux_audio, mux_bound, probe_duration, probe_media};
use reel_models::encoding::{OUTPUT_HEIGHT, OUTPUT_WIDTH};
use reel_models::{Artifact, ArtifactKind, MergeRequest, TimingTags, UnitResult};
use reel_storage::keys::scene_video_key;

use super::{extension_or, publish_timestamp, stages, unit_tags, Orchestrator};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::UnitLogger;
use crate::timing::StageClock;
use crate::workspace::WorkDir;

impl Orchestrator {
    /// Lay narration audio under a clip.
    ///
    /// The output runs for the shorter of the two inputs. When narration text
    /// is supplied, word-by-word karaoke captions are drawn over the narration
    /// duration, using explicit word timings when the request carries them.
    pub async fn merge_audio(&self, request: &MergeRequest) -> UnitResult {
        let logger = UnitLogger::new(request.scene_id.as_str(), stages::MERGE_AUDIO);
        let tags = unit_tags(request.project_id.as_ref(), request.scene_number);
        let clock = StageClock::start();

        let result = self
            .run_merge_audio(request, &tags, &logger)
            .instrument(logger.create_span())
            .await;

        self.finish_unit(
            request.scene_id.as_str(),
            stages::MERGE_AUDIO,
            &tags,
            &clock,
            &logger,
            result,
        )
        .await
    }

    async fn run_merge_audio(
        &self,
        request: &MergeRequest,
        tags: &TimingTags,
        logger: &UnitLogger,
    ) -> WorkerResult<UnitResult> {
        if request.skip_publish && request.project_id.is_none() {
            return Err(WorkerError::validation(
                "skip_publish requires a project_id to keep the clip in",
            ));
        }
        logger.log_start(&format!("{} + {}", request.video, request.audio));

        let dir = self.workspace.get_or_create(request.project_id.as_ref()).await?;
        let result = self.merge_in(request, &dir, tags, logger).await;
        self.teardown(&dir).await;
        result
    }

    async fn merge_in(
        &self,
        request: &MergeRequest,
        dir: &WorkDir,
        tags: &TimingTags,
        logger: &UnitLogger,
    ) -> WorkerResult<UnitResult> {
        let tag = request.file_tag();
        let video_name = format!("merge_video_{}.{}", tag, extension_or(request.video.extension(), "mp4"));
        let audio_name = format!("merge_audio_{}.{}", tag, extension_or(request.audio.extension(), "mp3"));

        let (video, audio) = tokio::try_join!(
            self.timing.measure(
                stages::MERGE_VIDEO_RESOLVE,
                tags,
                self.resolver
                    .resolve(&request.video, dir, &video_name, self.config.fetch_timeout),
            ),
            self.timing.measure(
                stages::MERGE_AUDIO_RESOLVE,
                tags,
                self.resolver
                    .resolve(&request.audio, dir, &audio_name, self.config.fetch_timeout),
            ),
        )?;

        let (video_info, audio_duration) = self
            .timing
            .measure(stages::MERGE_PROBE, tags, async {
                tokio::try_join!(
                    probe_media(&video, self.probe_timeout()),
                    probe_duration(&audio, self.probe_timeout()),
                )
            })
            .await?;

        let bound = mux_bound(video_info.duration, audio_duration);
        logger.log_progress(&format!(
            "video {:.2}s, audio {:.2}s, output {:.2}s",
            video_info.duration, audio_duration, bound
        ));

        let merged = dir.file(&format!("merged_{tag}.mp4"))?;
        self.timing
            .measure(
                stages::MERGE_MUX,
                tags,
                mux_audio(&video, &audio, &merged, bound, &self.encoding, &self.runner),
            )
            .await?;

        let mut artifact = Artifact::new(merged, ArtifactKind::MergedVideo).with_duration(bound);

        if let Some(text) = request.narration_text() {
            let script = self.karaoke_script(
                request,
                text,
                (
                    video_info.width.unwrap_or(OUTPUT_WIDTH),
                    video_info.height.unwrap_or(OUTPUT_HEIGHT),
                ),
                audio_duration,
            );

            if script.is_empty() {
                logger.log_warning("narration produced no karaoke events");
            } else {
                let captioned = dir.file(&format!("merged_karaoke_{tag}.mp4"))?;
                self.timing
                    .measure(
                        stages::KARAOKE_OVERLAY,
                        tags,
                        burn_subtitles(
                            artifact.path(),
                            &script,
                            dir.file(&format!("karaoke_{tag}.ass"))?,
                            &captioned,
                            &self.encoding,
                            &self.runner,
                        ),
                    )
                    .await?;
                logger.log_progress(&format!("{} karaoke events drawn", script.events.len()));
                artifact = Artifact::new(captioned, ArtifactKind::MergedVideo).with_duration(bound);
            }
        }

        let key = scene_video_key(&request.scene_id, true, publish_timestamp());
        self.deliver(
            request.scene_id.as_str(),
            artifact,
            &key,
            request.skip_publish,
            stages::MERGE_PUBLISH,
            tags,
        )
        .await
    }

    /// Karaoke captions for `text` on a `(width, height)` canvas, spread over
    /// the narration duration unless the request carries word timings.
    fn karaoke_script(
        &self,
        request: &MergeRequest,
        text: &str,
        (width, height): (u32, u32),
        audio_duration: f64,
    ) -> SubtitleScript {
        let header = ScriptHeader::karaoke(width, height, self.config.karaoke_font_size);
        let layout = KaraokeLayout::default().with_max_chars(self.config.karaoke_max_chars);
        match request.word_timings.as_deref() {
            Some(timings) if !timings.is_empty() => layout.script_from_timings(header, timings),
            _ => layout.script(header, text, audio_duration),
        }
    }
}
