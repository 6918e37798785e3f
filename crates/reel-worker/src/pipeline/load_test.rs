//! Synthetic encoder load test: loop source clips up to a target length
//! through the hardware encoder and report throughput.

use std::path::PathBuf;

use futures_util::future::try_join_all;
use tracing::Instrument;

use reel_media::{concat_reencode, plan_loop, probe_duration, ConcatEntry};
use reel_models::{
    sanitize_component, ArtifactKind, LoadTestReport, LoadTestRequest, LoadTestResult, TimingTags,
    UnitResult,
};
use reel_storage::keys::load_test_key;

use super::{extension_or, publish_timestamp, stages, Orchestrator};
use crate::error::WorkerResult;
use crate::logging::UnitLogger;
use crate::publisher::publish_terminal;
use crate::timing::StageClock;
use crate::workspace::WorkDir;

impl Orchestrator {
    /// Loop `request.sources` in order, trimming only the final segment, so
    /// the encoded output lasts exactly `request.target_duration` seconds.
    pub async fn synthetic_load_test(&self, request: &LoadTestRequest) -> LoadTestResult {
        let id = request.test_name.as_str();
        let logger = UnitLogger::new(id, stages::LOAD_TEST);
        let mut tags = TimingTags::new();
        tags.insert("test_name".to_string(), serde_json::json!(id));
        let clock = StageClock::start();

        let result = self
            .run_load_test(request, &tags, &logger, &clock)
            .instrument(logger.create_span())
            .await;

        let (result, report) = match result {
            Ok((outcome, report)) => (Ok(outcome), Some(report)),
            Err(e) => (Err(e), None),
        };
        let outcome = self
            .finish_unit(id, stages::LOAD_TEST, &tags, &clock, &logger, result)
            .await;
        LoadTestResult { outcome, report }
    }

    async fn run_load_test(
        &self,
        request: &LoadTestRequest,
        tags: &TimingTags,
        logger: &UnitLogger,
        clock: &StageClock,
    ) -> WorkerResult<(UnitResult, LoadTestReport)> {
        request.validate()?;
        logger.log_start(&format!(
            "{} sources → {:.1}s with {}",
            request.sources.len(),
            request.target_duration,
            self.config.hw_encoder
        ));

        let dir = self.workspace.get_or_create(None).await?;
        let result = self.encode_loop(request, &dir, tags, logger, clock).await;
        self.teardown(&dir).await;
        result
    }

    async fn encode_loop(
        &self,
        request: &LoadTestRequest,
        dir: &WorkDir,
        tags: &TimingTags,
        logger: &UnitLogger,
        clock: &StageClock,
    ) -> WorkerResult<(UnitResult, LoadTestReport)> {
        let download = StageClock::start();
        let sources: Vec<PathBuf> = self
            .timing
            .measure(
                stages::LOAD_TEST_RESOLVE,
                tags,
                try_join_all(request.sources.iter().enumerate().map(|(i, locator)| {
                    let name = format!(
                        "load_source_{:03}.{}",
                        i,
                        extension_or(locator.extension(), "mp4")
                    );
                    async move {
                        self.resolver
                            .resolve(locator, dir, &name, self.config.fetch_timeout)
                            .await
                    }
                })),
            )
            .await?;
        let download_secs = download.elapsed_secs();

        let durations: Vec<f64> = self
            .timing
            .measure(
                stages::LOAD_TEST_PROBE,
                tags,
                try_join_all(
                    sources
                        .iter()
                        .map(|path| probe_duration(path, self.probe_timeout())),
                ),
            )
            .await?;

        let plan = plan_loop(&durations, request.target_duration)?;
        logger.log_progress(&format!(
            "{} segments over {} passes",
            plan.segments.len(),
            plan.passes(sources.len())
        ));

        let entries: Vec<ConcatEntry> = plan
            .segments
            .iter()
            .map(|segment| {
                let path = sources[segment.source_index].clone();
                if segment.trimmed {
                    ConcatEntry::trimmed(path, segment.duration)
                } else {
                    ConcatEntry::new(path)
                }
            })
            .collect();

        let output = dir.file(&format!(
            "loadtest_{}.mp4",
            sanitize_component(&request.test_name)
        ))?;
        let encoding = self
            .encoding
            .clone()
            .for_encoder(self.config.hw_encoder.as_str());

        let encode = StageClock::start();
        self.timing
            .measure(
                stages::LOAD_TEST_ENCODE,
                tags,
                concat_reencode(
                    &entries,
                    dir.file("loadtest_list.txt")?,
                    &output,
                    &encoding,
                    Some(request.target_duration),
                    &self.runner,
                ),
            )
            .await?;
        let encode_secs = encode.elapsed_secs();

        let output_duration = probe_duration(&output, self.probe_timeout()).await?;

        let upload = StageClock::start();
        let key = load_test_key(&request.test_name, publish_timestamp());
        let url = self
            .timing
            .measure(
                stages::LOAD_TEST_PUBLISH,
                tags,
                publish_terminal(
                    self.store.as_ref(),
                    &output,
                    &key,
                    ArtifactKind::FinalVideo.content_type(),
                ),
            )
            .await?;
        let upload_secs = upload.elapsed_secs();

        let report = LoadTestReport {
            test_name: request.test_name.clone(),
            video_url: url.clone(),
            source_count: sources.len(),
            segment_count: plan.segments.len(),
            target_duration: request.target_duration,
            output_duration,
            download_secs,
            encode_secs,
            upload_secs,
            total_secs: clock.elapsed_secs(),
            encode_speed: if encode_secs > 0.0 {
                output_duration / encode_secs
            } else {
                0.0
            },
        };
        logger.log_progress(&format!(
            "encoded {:.1}s in {:.1}s ({:.2}x)",
            output_duration, encode_secs, report.encode_speed
        ));

        Ok((UnitResult::published(&request.test_name, url, Some(output_duration)), report))
    }
}
