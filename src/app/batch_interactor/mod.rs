// Batch interactor - Runs many pipeline jobs concurrently

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::app::pipeline_interactor::{JobReport, JobRequest, PipelineInteractor};
use crate::error::Stage;
use crate::utils::path::is_video_file;

/// Interactor for processing a set of videos
pub struct BatchInteractor {
    pipeline: Arc<PipelineInteractor>,
    max_jobs: usize,
}

impl BatchInteractor {
    /// Create new batch interactor running at most `max_jobs` pipelines at once
    pub fn new(pipeline: Arc<PipelineInteractor>, max_jobs: usize) -> Self {
        Self {
            pipeline,
            max_jobs: max_jobs.max(1),
        }
    }

    /// Run every request; reports come back in request order.
    ///
    /// Each job gets a child of `cancel`, so cancelling the batch stops all
    /// jobs while one job failing never affects the others.
    pub async fn run(
        &self,
        requests: Vec<JobRequest>,
        cancel: &CancellationToken,
    ) -> Vec<JobReport> {
        info!(
            "Processing {} videos with up to {} concurrent jobs",
            requests.len(),
            self.max_jobs
        );
        let slots = Arc::new(Semaphore::new(self.max_jobs));
        let mut tasks = JoinSet::new();

        for (index, request) in requests.iter().cloned().enumerate() {
            let pipeline = Arc::clone(&self.pipeline);
            let slots = Arc::clone(&slots);
            let job_cancel = cancel.child_token();
            tasks.spawn(async move {
                let _slot = tokio::select! {
                    slot = slots.acquire_owned() => slot.ok(),
                    // The pipeline sees the cancelled token and reports it
                    _ = job_cancel.cancelled() => None,
                };
                debug!("Job {} acquired a slot", index);
                (index, pipeline.run(request, job_cancel).await)
            });
        }

        let mut reports: Vec<Option<JobReport>> = vec![None; requests.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => reports[index] = Some(report),
                Err(e) => error!("Pipeline task aborted: {}", e),
            }
        }

        let reports: Vec<JobReport> = reports
            .into_iter()
            .zip(requests.iter())
            .map(|(report, request)| {
                report.unwrap_or_else(|| {
                    JobReport::aborted(request, Stage::Setup, "pipeline task aborted")
                })
            })
            .collect();

        let failed = reports.iter().filter(|r| !r.success).count();
        if failed > 0 {
            warn!("{} of {} jobs failed", failed, reports.len());
        } else {
            info!("All {} jobs succeeded", reports.len());
        }
        reports
    }
}

/// Expand inputs: files are kept as given, directories are walked for video files
pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| is_video_file(path) && !is_generated_output(path))
                .collect();
            found.sort();
            debug!("Found {} videos under {}", found.len(), input.display());
            expanded.extend(found);
        } else {
            expanded.push(input.clone());
        }
    }
    expanded
}

/// Outputs of earlier runs and partial files are not inputs
fn is_generated_output(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.contains(".subbed.") || (name.starts_with('.') && name.contains(".part."))
}
