//! Ordered scene clips → one final video.

use std::path::PathBuf;

use futures_util::future::try_join_all;
use tracing::Instrument;

use reel_media::{concat_stream_copy, probe_duration};
use reel_models::{sanitize_component, ArtifactKind, ConcatRequest, Locator, TimingTags, UnitResult};
use reel_storage::keys::final_video_key;

use super::{extension_or, publish_timestamp, stages, unit_tags, Orchestrator};
use crate::error::WorkerResult;
use crate::logging::UnitLogger;
use crate::publisher::publish_terminal;
use crate::timing::StageClock;

impl Orchestrator {
    /// Join `request.videos` in order, without re-encoding, and publish the
    /// result.
    ///
    /// This is the last stage of a project: its working directory is removed
    /// afterward whether or not the join succeeded.
    pub async fn concatenate(&self, request: &ConcatRequest) -> UnitResult {
        let id = request.project_id.as_str();
        let logger = UnitLogger::new(id, stages::CONCATENATE);
        let tags = unit_tags(Some(&request.project_id), None);
        let clock = StageClock::start();

        let result = self
            .run_concatenate(request, &tags, &logger)
            .instrument(logger.create_span())
            .await;

        if let Err(e) = self.workspace.cleanup_project(&request.project_id).await {
            logger.log_warning(&format!("failed to remove project directory: {e}"));
        }

        self.finish_unit(id, stages::CONCATENATE, &tags, &clock, &logger, result)
            .await
    }

    async fn run_concatenate(
        &self,
        request: &ConcatRequest,
        tags: &TimingTags,
        logger: &UnitLogger,
    ) -> WorkerResult<UnitResult> {
        request.validate()?;
        logger.log_start(&format!("{} clips", request.videos.len()));

        let id = request.project_id.as_str();
        let key = final_video_key(&request.project_id, publish_timestamp());

        if let [only] = request.videos.as_slice() {
            return match only {
                Locator::Remote(url) => {
                    logger.log_progress("single published clip, nothing to join");
                    Ok(UnitResult::published(id, url.as_str(), None))
                }
                Locator::Local(path) => {
                    let duration = probe_duration(path, self.probe_timeout()).await.ok();
                    let url = self
                        .timing
                        .measure(
                            stages::CONCAT_PUBLISH,
                            tags,
                            publish_terminal(
                                self.store.as_ref(),
                                path,
                                &key,
                                ArtifactKind::FinalVideo.content_type(),
                            ),
                        )
                        .await?;
                    Ok(UnitResult::published(id, url, duration))
                }
            };
        }

        let dir = self.workspace.get_or_create(Some(&request.project_id)).await?;

        let inputs: Vec<PathBuf> = self
            .timing
            .measure(
                stages::CONCAT_RESOLVE_ALL,
                tags,
                try_join_all(request.videos.iter().enumerate().map(|(i, locator)| {
                    let name = format!(
                        "concat_input_{:03}.{}",
                        i,
                        extension_or(locator.extension(), "mp4")
                    );
                    let dir = &dir;
                    async move {
                        self.resolver
                            .resolve(locator, dir, &name, self.config.fetch_timeout)
                            .await
                    }
                })),
            )
            .await?;

        let output = dir.file(&format!("final_{}.mp4", sanitize_component(id)))?;
        self.timing
            .measure(
                stages::CONCAT_STREAM_COPY,
                tags,
                concat_stream_copy(&inputs, dir.file("concat_list.txt")?, &output, &self.runner),
            )
            .await?;

        let duration = self
            .timing
            .measure(
                stages::CONCAT_PROBE,
                tags,
                probe_duration(&output, self.probe_timeout()),
            )
            .await?;
        logger.log_progress(&format!("joined {} clips into {:.2}s", inputs.len(), duration));

        let url = self
            .timing
            .measure(
                stages::CONCAT_PUBLISH,
                tags,
                publish_terminal(
                    self.store.as_ref(),
                    &output,
                    &key,
                    ArtifactKind::FinalVideo.content_type(),
                ),
            )
            .await?;
        Ok(UnitResult::published(id, url, Some(duration)))
    }
}
