//! Drives one job from submission to a terminal state.
//!
//! Stages run strictly in order: fetch both clips, caption the source clip,
//! merge it with the overlay clip, publish the result. Progress is reported
//! at fixed checkpoints. Whatever happens, the job's scratch directory is
//! cleaned up before the terminal state is recorded.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use vmerge_media::{
    layout_caption, ConcatStrategy, ConcatTier, FfmpegEngine, HttpFetcher, MediaError,
    MediaFetcher, MediaTransformEngine, TempAssets,
};
use vmerge_models::{JobId, SubmitJobRequest};
use vmerge_storage::StoragePublisher;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::logging::JobLogger;
use crate::metrics;
use crate::registry::JobRegistry;

/// Progress checkpoints.
pub mod progress {
    pub const FETCH_STARTED: u8 = 10;
    pub const SOURCE_FETCHED: u8 = 30;
    pub const OVERLAY_FETCHED: u8 = 50;
    pub const CAPTIONED: u8 = 70;
    pub const MERGED: u8 = 85;
    pub const PUBLISHED: u8 = 95;
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub job_id: JobId,
    pub video_url: String,
    pub tier: ConcatTier,
}

/// Sequences the pipeline stages for submitted jobs.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<dyn JobRegistry>,
    fetcher: Arc<dyn MediaFetcher>,
    engine: Arc<dyn MediaTransformEngine>,
    publisher: Arc<dyn StoragePublisher>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        fetcher: Arc<dyn MediaFetcher>,
        engine: Arc<dyn MediaTransformEngine>,
        publisher: Arc<dyn StoragePublisher>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            engine,
            publisher,
            config,
        }
    }

    /// Build with the HTTP fetcher and the FFmpeg engine.
    pub fn with_defaults(
        registry: Arc<dyn JobRegistry>,
        publisher: Arc<dyn StoragePublisher>,
        config: PipelineConfig,
    ) -> PipelineResult<Self> {
        let fetcher = HttpFetcher::new()?;
        let engine = FfmpegEngine::new(Default::default(), config.text_style.clone())
            .with_timeout(config.transform_timeout);
        Ok(Self::new(
            registry,
            Arc::new(fetcher),
            Arc::new(engine),
            publisher,
            config,
        ))
    }

    pub fn registry(&self) -> &Arc<dyn JobRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Register a job and start it in the background.
    ///
    /// Returns as soon as the job is registered; the caller never waits on
    /// media work.
    pub async fn submit(&self, request: SubmitJobRequest) -> JobId {
        let id = self.registry.create().await;
        metrics::record_job_submitted();

        let this = self.clone();
        let job_id = id.clone();
        tokio::spawn(async move {
            // Outcome is recorded in the registry
            let _ = this.run(job_id, request).await;
        });

        id
    }

    /// Run an already-registered job to its terminal state.
    pub async fn run(&self, id: JobId, request: SubmitJobRequest) -> PipelineResult<RunReport> {
        let logger = JobLogger::new(&id, "merge");
        let span = logger.create_span();
        self.run_with_logger(id, request, logger).instrument(span).await
    }

    async fn run_with_logger(
        &self,
        id: JobId,
        request: SubmitJobRequest,
        logger: JobLogger,
    ) -> PipelineResult<RunReport> {
        let started = Instant::now();
        logger.log_start(&format!(
            "{} + {} (caption alignment {})",
            request.source_clip_url, request.overlay_clip_url, request.alignment
        ));

        let assets = match TempAssets::create_in(&self.config.work_dir) {
            Ok(assets) => assets,
            Err(e) => {
                let err = match e {
                    MediaError::Io(io) => PipelineError::Io(io),
                    other => PipelineError::from(other),
                };
                return self.finish(&id, Err(err), started, &logger).await;
            }
        };

        let result = self.execute(&id, &request, &assets, &logger).await;

        let report = assets.cleanup().await;
        if report.failed > 0 {
            metrics::record_cleanup_failures(report.failed);
            logger.log_warning(&format!("{} temp assets could not be removed", report.failed));
        }

        self.finish(&id, result, started, &logger).await
    }

    async fn execute(
        &self,
        id: &JobId,
        request: &SubmitJobRequest,
        assets: &TempAssets,
        logger: &JobLogger,
    ) -> PipelineResult<RunReport> {
        let source = assets.allocate("source.mp4");
        let overlay = assets.allocate("overlay.mp4");
        let captioned = assets.allocate("captioned.mp4");
        let merged = assets.allocate("merged.mp4");

        // Fetch
        self.checkpoint(id, logger, Stage::Fetch, progress::FETCH_STARTED, "fetching clips")
            .await;
        let stage_started = Instant::now();
        with_deadline(Stage::Fetch, self.config.fetch_timeout, async {
            self.fetch(&request.source_clip_url, &source).await?;
            self.checkpoint(id, logger, Stage::Fetch, progress::SOURCE_FETCHED, "source clip fetched")
                .await;
            self.fetch(&request.overlay_clip_url, &overlay).await
        })
        .await?;
        metrics::record_stage_duration(Stage::Fetch.as_str(), stage_started.elapsed().as_secs_f64());
        self.checkpoint(id, logger, Stage::Fetch, progress::OVERLAY_FETCHED, "overlay clip fetched")
            .await;

        // Caption
        let stage_started = Instant::now();
        let layout = layout_caption(&request.caption(), &self.config.layout);
        if layout.is_empty() {
            logger.log_warning("caption is blank, source clip passes through uncaptioned");
        }
        self.engine.overlay_text(&source, &captioned, &layout).await?;
        assets.discard(&source).await;
        metrics::record_stage_duration(Stage::Caption.as_str(), stage_started.elapsed().as_secs_f64());
        self.checkpoint(
            id,
            logger,
            Stage::Caption,
            progress::CAPTIONED,
            &format!("caption rendered on {} lines", layout.lines.len()),
        )
        .await;

        // Concat
        let stage_started = Instant::now();
        let outcome = ConcatStrategy::new(self.engine.clone())
            .merge(&captioned, &overlay, &merged, assets)
            .await?;
        metrics::record_stage_duration(Stage::Concat.as_str(), stage_started.elapsed().as_secs_f64());
        if !outcome.tier.includes_overlay() {
            metrics::record_merged_without_overlay();
            logger.log_warning("overlay clip could not be merged, publishing captioned clip only");
        }
        self.checkpoint(
            id,
            logger,
            Stage::Concat,
            progress::MERGED,
            &format!("clips merged via {}", outcome.tier),
        )
        .await;

        // Publish
        let stage_started = Instant::now();
        let logical_name = format!("{id}.mp4");
        let video_url = with_deadline(
            Stage::Publish,
            self.config.publish_timeout,
            self.publisher.publish(&outcome.output, &logical_name),
        )
        .await?;
        metrics::record_stage_duration(Stage::Publish.as_str(), stage_started.elapsed().as_secs_f64());
        self.checkpoint(id, logger, Stage::Publish, progress::PUBLISHED, "published")
            .await;

        Ok(RunReport {
            job_id: id.clone(),
            video_url,
            tier: outcome.tier,
        })
    }

    async fn fetch(&self, url: &str, destination: &std::path::Path) -> PipelineResult<u64> {
        self.fetcher
            .fetch(url, destination)
            .await
            .map_err(PipelineError::fetch_failed)
    }

    async fn checkpoint(&self, id: &JobId, logger: &JobLogger, stage: Stage, value: u8, message: &str) {
        self.registry.set_progress(id, value).await;
        logger.log_progress(stage, value, message);
    }

    /// Record the terminal state. Runs after cleanup.
    async fn finish(
        &self,
        id: &JobId,
        result: PipelineResult<RunReport>,
        started: Instant,
        logger: &JobLogger,
    ) -> PipelineResult<RunReport> {
        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(report) => {
                self.registry.complete(id, report.video_url.clone()).await;
                metrics::record_job_completed(elapsed);
                logger.log_completion(&format!("{} in {:.1}s", report.video_url, elapsed));
            }
            Err(e) => {
                self.registry.fail(id, e.to_string()).await;
                metrics::record_job_failed(e.kind(), elapsed);
                logger.log_error(&e.to_string());
            }
        }
        result
    }
}

/// Await `fut` for at most `limit`; expiry is a stage timeout.
async fn with_deadline<T, E, F>(stage: Stage, limit: Duration, fut: F) -> PipelineResult<T>
where
    F: Future<Output = Result<T, E>>,
    PipelineError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(PipelineError::from),
        Err(_) => Err(PipelineError::timeout(stage, limit.as_secs())),
    }
}
