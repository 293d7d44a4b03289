// Pipeline interactor - Orchestrates one video from probe to muxed output

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::scratch::create_scratch_dir;
use crate::engine::{JobContext, Muxer};
use crate::error::{BisubError, PipelineError, Stage};
use crate::ports::*;
use crate::segmenter::CaptionSegmenter;
use crate::utils::path::default_output_path;
use crate::utils::retry::{retry_with_backoff, RetryError};

/// One video to process
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub input: PathBuf,
    /// Explicit output path; derived from the input name when absent
    pub output: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub source_language: String,
    /// `None` produces a single-track output in the source language
    pub target_language: Option<String>,
}

impl JobRequest {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            default_output_path(
                &self.input,
                self.out_dir.as_deref(),
                &self.source_language,
                self.target_language.as_deref(),
            )
        })
    }
}

/// Machine-readable outcome of one job
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: JobId,
    pub input: PathBuf,
    pub output: PathBuf,
    pub success: bool,
    pub failed_stage: Option<Stage>,
    pub error: Option<String>,
    pub used_reencode: bool,
    pub caption_count: usize,
    pub skipped_segments: usize,
    pub translation_fallbacks: usize,
    pub retained_artifacts: Vec<PathBuf>,
    pub retained_scratch_dir: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl JobReport {
    fn new(job_id: JobId, request: &JobRequest, started_at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            input: request.input.clone(),
            output: request.output_path(),
            success: false,
            failed_stage: None,
            error: None,
            used_reencode: false,
            caption_count: 0,
            skipped_segments: 0,
            translation_fallbacks: 0,
            retained_artifacts: Vec::new(),
            retained_scratch_dir: None,
            started_at,
            finished_at: started_at,
            elapsed_ms: 0,
        }
    }

    /// Report for a job that never ran to completion (e.g. its task panicked)
    pub fn aborted(request: &JobRequest, stage: Stage, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut report = Self::new(JobId::generate(&request.input), request, now);
        report.failed_stage = Some(stage);
        report.error = Some(reason.into());
        report
    }
}

/// Interactor for the full subtitle pipeline
pub struct PipelineInteractor {
    probe_port: Arc<dyn ProbePort>,
    transcription_port: Arc<dyn TranscriptionPort>,
    translator_port: Arc<dyn TranslatorPort>,
    muxer: Arc<Muxer>,
    config: Arc<PipelineConfig>,
    network: Arc<Semaphore>,
}

impl PipelineInteractor {
    /// Create new pipeline interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        transcription_port: Arc<dyn TranscriptionPort>,
        translator_port: Arc<dyn TranslatorPort>,
        muxer: Arc<Muxer>,
        config: Arc<PipelineConfig>,
        network: Arc<Semaphore>,
    ) -> Self {
        Self {
            probe_port,
            transcription_port,
            translator_port,
            muxer,
            config,
            network,
        }
    }

    /// Run one job to completion. Failures are reported, never raised.
    pub async fn run(&self, request: JobRequest, cancel: CancellationToken) -> JobReport {
        let job_id = JobId::generate(&request.input);
        let clock = Instant::now();
        let mut report = JobReport::new(job_id.clone(), &request, Utc::now());
        info!("[{}] Starting job for {}", job_id, request.input.display());

        match self.execute(&request, &job_id, &cancel, &mut report).await {
            Ok(()) => {
                report.success = true;
                info!(
                    "[{}] Job finished: {} ({} captions{})",
                    job_id,
                    report.output.display(),
                    report.caption_count,
                    if report.used_reencode { ", re-encoded" } else { "" }
                );
            }
            Err(err) => {
                if err.is_cancelled() {
                    warn!("[{}] Job cancelled during {}", job_id, err.stage);
                } else {
                    error!("[{}] Job failed: {}", job_id, err);
                }
                report.failed_stage = Some(err.stage);
                report.error = Some(err.source.to_string());
            }
        }

        report.finished_at = Utc::now();
        report.elapsed_ms = clock.elapsed().as_millis() as u64;
        report
    }

    async fn execute(
        &self,
        request: &JobRequest,
        job_id: &JobId,
        cancel: &CancellationToken,
        report: &mut JobReport,
    ) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::new(Stage::Setup, BisubError::Cancelled));
        }
        let output_path = request.output_path();
        if output_path == request.input {
            return Err(PipelineError::new(
                Stage::Setup,
                MuxError::InvalidRequest(
                    "output path must differ from the input video".to_string(),
                ),
            ));
        }

        // Probe
        let profile = self
            .probe_port
            .probe(&request.input)
            .await
            .map_err(|e| PipelineError::new(Stage::Probe, e))?;

        let scratch = create_scratch_dir(&self.config.scratch.root, job_id.as_str())
            .map_err(|e| PipelineError::new(Stage::Setup, e))?;
        let result = self
            .execute_in_scratch(request, job_id, cancel, report, &profile, scratch.path())
            .await;

        let keep = match &result {
            Ok(()) => self.config.scratch.keep_artifacts,
            Err(err) => self.config.scratch.retain_on_failure && !err.is_cancelled(),
        };
        if keep {
            report.retained_scratch_dir = Some(scratch.keep());
        } else {
            // Everything inside goes with the directory
            report.retained_artifacts.clear();
        }
        result
    }

    async fn execute_in_scratch(
        &self,
        request: &JobRequest,
        job_id: &JobId,
        cancel: &CancellationToken,
        report: &mut JobReport,
        profile: &MediaProfile,
        scratch_dir: &Path,
    ) -> Result<(), PipelineError> {
        // Transcribe
        let raw = self.transcribe(request, cancel).await?;
        info!("[{}] Transcript has {} segments", job_id, raw.len());

        // Segment
        let outcome =
            CaptionSegmenter::from_config(&self.config.segmentation).segment_with_report(&raw);
        report.skipped_segments = outcome.skipped.len();
        let mut captions = outcome.captions;
        report.caption_count = captions.len();
        if captions.is_empty() {
            warn!("[{}] No captions produced; output will carry empty subtitles", job_id);
        }

        // Translate
        if let Some(target) = &request.target_language {
            report.translation_fallbacks = self
                .translate(&mut captions, &request.source_language, target, cancel)
                .await?;
        }

        // Render and mux
        let tracks = self.build_tracks(captions, request, profile);
        let mux_request = MuxRequest::new(
            request.input.clone(),
            tracks,
            report.output.clone(),
            profile.clone(),
        )
        .map_err(|e| PipelineError::new(Stage::Mux, e))?;
        let ctx = JobContext {
            job_id: job_id.clone(),
            scratch_dir: scratch_dir.to_path_buf(),
            cancel: cancel.clone(),
        };

        let result = self.muxer.mux(&mux_request, &ctx).await;
        report.used_reencode = result.used_reencode;
        report.retained_artifacts = result.artifacts.clone();
        match result.error {
            None if result.success => Ok(()),
            Some(err) => Err(PipelineError::new(Stage::Mux, err)),
            None => Err(PipelineError::new(
                Stage::Mux,
                MuxError::EmptyOutput(result.output_path.display().to_string()),
            )),
        }
    }

    async fn transcribe(
        &self,
        request: &JobRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranscriptSegment>, PipelineError> {
        let transcriber = &self.transcription_port;
        let network = &self.network;
        let input = request.input.as_path();
        let language = request.source_language.as_str();

        retry_with_backoff(
            &self.config.retry,
            cancel,
            "transcription",
            TranscriptionError::is_transient,
            |_attempt| async move {
                let _permit = network
                    .acquire()
                    .await
                    .map_err(|_| TranscriptionError::Cancelled)?;
                transcriber.transcribe(input, language, cancel).await
            },
        )
        .await
        .map_err(|e| {
            PipelineError::new(
                Stage::Transcribe,
                e.into_inner(|| TranscriptionError::Cancelled),
            )
        })
    }

    /// Fill in `translated_text` for every caption. Returns the number of fallbacks.
    ///
    /// Each caption is retried with backoff; once retries are exhausted or the
    /// error is permanent, the caption keeps its source text.
    async fn translate(
        &self,
        captions: &mut [Caption],
        source: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<usize, PipelineError> {
        let translator = &self.translator_port;
        let network = &self.network;
        let mut fallbacks = 0;

        for caption in captions.iter_mut() {
            let text = caption.source_text.as_str();
            let translated = retry_with_backoff(
                &self.config.translation.retry,
                cancel,
                "translation",
                TranslationError::is_transient,
                |_attempt| async move {
                    let _permit = network
                        .acquire()
                        .await
                        .map_err(|_| TranslationError::Cancelled)?;
                    translator.translate(text, source, target, cancel).await
                },
            )
            .await;

            let translated = match translated {
                Ok(text) => text,
                Err(RetryError::Cancelled)
                | Err(RetryError::Permanent(TranslationError::Cancelled)) => {
                    return Err(PipelineError::new(Stage::Translate, BisubError::Cancelled));
                }
                Err(e) => {
                    let e = e.into_inner(|| TranslationError::Cancelled);
                    warn!(
                        "Translation failed for caption at {:.2}s, keeping source text: {}",
                        caption.start_seconds, e
                    );
                    fallbacks += 1;
                    caption.source_text.clone()
                }
            };
            caption.translated_text = Some(translated);
        }
        if fallbacks > 0 {
            warn!("{} of {} captions fell back to source text", fallbacks, captions.len());
        }
        Ok(fallbacks)
    }

    /// Lowest track first
    fn build_tracks(
        &self,
        captions: Vec<Caption>,
        request: &JobRequest,
        profile: &MediaProfile,
    ) -> Vec<SubtitleTrack> {
        let layout = &self.config.layout;
        let styles = &self.config.styles;
        let source_style = styles
            .source
            .resolve(&request.source_language, profile.height, layout);

        let Some(target) = &request.target_language else {
            return vec![SubtitleTrack::new(captions, source_style, TrackLane::Source)];
        };
        let translation_style = styles.translation.resolve(target, profile.height, layout);
        let source = SubtitleTrack::new(captions.clone(), source_style, TrackLane::Source);
        let translation = SubtitleTrack::new(captions, translation_style, TrackLane::Translation);
        if layout.translation_on_bottom {
            vec![translation, source]
        } else {
            vec![source, translation]
        }
    }
}
