//! Muxing engine
//!
//! Attaches rendered subtitles to the input video. The fast path stream-copies
//! audio and video and adds soft subtitle streams. When that is impossible or
//! fails, the re-encode path burns the dual-language document into the frames.
//! Output is always written to a temporary file next to the destination and
//! renamed into place only once the encoder succeeded.

pub mod args;
pub mod scratch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::EncoderSettings;
use crate::domain::errors::MuxError;
use crate::domain::model::*;
use crate::domain::rules::{EncodePathSelector, SubtitleCodec};
use crate::ports::{EncoderInvocation, EncoderPort};
use crate::subtitles::{render_srt, SubtitleDocument, SubtitleRenderer};
use crate::utils::path::partial_output_path;

use self::args::{fast_path_args, reencode_args, SubtitleInput};
use self::scratch::{ArtifactSet, TempOutput};

/// Per-job context handed to the muxer
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_id: JobId,
    /// Directory for intermediate subtitle documents; created if missing
    pub scratch_dir: PathBuf,
    pub cancel: CancellationToken,
}

/// When intermediate subtitle documents outlive the mux
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactPolicy {
    pub keep_on_success: bool,
    pub keep_on_failure: bool,
}

/// Chooses an encode path and drives the encoder through it
pub struct Muxer {
    encoder: Arc<dyn EncoderPort>,
    renderer: SubtitleRenderer,
    settings: EncoderSettings,
    artifacts: ArtifactPolicy,
}

impl Muxer {
    /// Create new muxer
    pub fn new(
        encoder: Arc<dyn EncoderPort>,
        renderer: SubtitleRenderer,
        settings: EncoderSettings,
        artifacts: ArtifactPolicy,
    ) -> Self {
        Self {
            encoder,
            renderer,
            settings,
            artifacts,
        }
    }

    /// Pick the encode path for a profile and target container
    pub fn decide(&self, profile: &MediaProfile, target: &Container) -> EncodePath {
        EncodePathSelector::decide(profile, target, self.settings.require_burn_in)
    }

    /// Produce `request.output_path`. Never fails outright: failures are reported in the result.
    pub async fn mux(&self, request: &MuxRequest, ctx: &JobContext) -> MuxResult {
        let output = request.output_path.clone();
        if ctx.cancel.is_cancelled() {
            return MuxResult::failed(output, false, MuxError::Cancelled);
        }

        let target = Container::from_path(&output);
        let planned = self.decide(&request.profile, &target);
        if let Some(reason) = EncodePathSelector::fast_path_blocker(&request.profile, &target) {
            info!("[{}] Fast path unavailable: {}", ctx.job_id, reason);
        }
        info!("[{}] Muxing {} via the {}", ctx.job_id, output.display(), planned);
        if EncodePathSelector::loses_stacking(planned, request.subtitle_tracks.len()) {
            warn!(
                "[{}] {} tracks attached as soft subtitles: players show one at a time and \
                 the stacked layout applies only with burn-in (--burn-in)",
                ctx.job_id,
                request.subtitle_tracks.len()
            );
        }

        if let Err(e) = prepare_dirs(&output, &ctx.scratch_dir) {
            return MuxResult::failed(output, false, e);
        }
        let mut artifacts = ArtifactSet::new(self.artifacts.keep_on_success);

        if planned == EncodePath::FastPath {
            match self.run_fast_path(request, ctx, &target, &mut artifacts).await {
                Ok(()) => {
                    info!("[{}] Wrote {} via the fast path", ctx.job_id, output.display());
                    return finish(MuxResult::succeeded(output, false), &artifacts);
                }
                Err(MuxError::Cancelled) => {
                    artifacts.set_keep(self.artifacts.keep_on_failure);
                    let result = MuxResult::failed(output, false, MuxError::Cancelled);
                    return finish(result, &artifacts);
                }
                Err(e) => {
                    warn!("[{}] Fast path failed ({}), falling back to re-encode", ctx.job_id, e);
                }
            }
        }

        match self.run_reencode_path(request, ctx, &target, &mut artifacts).await {
            Ok(()) => {
                info!("[{}] Wrote {} via the re-encode path", ctx.job_id, output.display());
                finish(MuxResult::succeeded(output, true), &artifacts)
            }
            Err(e) => {
                error!("[{}] Mux failed: {}", ctx.job_id, e);
                artifacts.set_keep(self.artifacts.keep_on_failure);
                finish(MuxResult::failed(output, true, e), &artifacts)
            }
        }
    }

    async fn run_fast_path(
        &self,
        request: &MuxRequest,
        ctx: &JobContext,
        target: &Container,
        artifacts: &mut ArtifactSet,
    ) -> Result<(), MuxError> {
        let codec = SubtitleCodec::for_container(target).ok_or_else(|| {
            MuxError::InvalidRequest(format!("no soft subtitle codec for {:?}", target))
        })?;

        let mut inputs = Vec::with_capacity(request.subtitle_tracks.len());
        for track in &request.subtitle_tracks {
            let content = match codec {
                SubtitleCodec::MovText => render_srt(&track.captions, track.lane),
                SubtitleCodec::Ass => self.renderer.render(track, &request.profile).to_ass_string(),
            };
            let path = ctx.scratch_dir.join(format!(
                "{}.{}.{}",
                ctx.job_id,
                track.language(),
                codec.document_extension()
            ));
            inputs.push(SubtitleInput {
                path: artifacts.write(path, &content)?,
                language: track.language().to_string(),
            });
        }

        let temp = TempOutput::new(partial_output_path(
            &request.output_path,
            &format!("{}-fast", ctx.job_id),
        ));
        let args = fast_path_args(
            &request.input_video_path,
            &inputs,
            codec,
            request.profile.has_audio(),
            target,
            temp.path(),
        );
        self.run_encoder(EncodePath::FastPath, args, temp, request, ctx).await
    }

    async fn run_reencode_path(
        &self,
        request: &MuxRequest,
        ctx: &JobContext,
        target: &Container,
        artifacts: &mut ArtifactSet,
    ) -> Result<(), MuxError> {
        let document = self.burn_in_document(request);
        let document_path = artifacts.write(
            ctx.scratch_dir.join(format!("{}.burn.ass", ctx.job_id)),
            &document.to_ass_string(),
        )?;

        let temp = TempOutput::new(partial_output_path(
            &request.output_path,
            &format!("{}-reencode", ctx.job_id),
        ));
        let args = reencode_args(
            &request.input_video_path,
            &document_path,
            &self.settings,
            request.profile.has_audio(),
            target,
            temp.path(),
        );
        self.run_encoder(EncodePath::ReencodePath, args, temp, request, ctx).await
    }

    /// Dual document when two tracks are present, single otherwise
    pub fn burn_in_document(&self, request: &MuxRequest) -> SubtitleDocument {
        match request.subtitle_tracks.as_slice() {
            [lower, upper] => self.renderer.render_dual(lower, upper, &request.profile),
            [single] => self.renderer.render(single, &request.profile),
            // MuxRequest::new guarantees one or two tracks
            _ => SubtitleDocument {
                script_info: crate::subtitles::ScriptInfo::new(
                    "",
                    request.profile.width,
                    request.profile.height,
                ),
                styles: Vec::new(),
                events: Vec::new(),
            },
        }
    }

    async fn run_encoder(
        &self,
        path: EncodePath,
        args: Vec<String>,
        temp: TempOutput,
        request: &MuxRequest,
        ctx: &JobContext,
    ) -> Result<(), MuxError> {
        let invocation = EncoderInvocation {
            args,
            output_path: temp.path().to_path_buf(),
            timeout: self.settings.timeout_for(request.profile.duration_seconds),
            path,
        };
        self.encoder.run(&invocation, &ctx.cancel).await?;

        if temp.is_empty() {
            return Err(MuxError::EmptyOutput(temp.path().display().to_string()));
        }
        temp.persist(&request.output_path)?;
        Ok(())
    }
}

fn prepare_dirs(output: &Path, scratch_dir: &Path) -> Result<(), MuxError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir_all(scratch_dir)?;
    Ok(())
}

fn finish(mut result: MuxResult, artifacts: &ArtifactSet) -> MuxResult {
    result.artifacts = artifacts.retained();
    result
}
