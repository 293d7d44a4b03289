//! Muxer tests against a scripted encoder

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use bisub::config::{EncoderSettings, LayoutConfig, StylesConfig};
use bisub::domain::model::{
    Caption, EncodePath, JobId, MediaProfile, MuxRequest, SubtitleTrack, TrackLane,
};
use bisub::engine::{ArtifactPolicy, JobContext, Muxer};
use bisub::ports::{EncoderInvocation, EncoderPort};
use bisub::subtitles::SubtitleRenderer;
use bisub::MuxError;

/// Encoder that writes a few bytes to the requested output or fails on demand
#[derive(Default)]
struct ScriptedEncoder {
    fail_fast_path: bool,
    fail_reencode_path: bool,
    cancel_fast_path: bool,
    calls: Mutex<Vec<EncodePath>>,
    seen_args: Mutex<Vec<Vec<String>>>,
}

impl ScriptedEncoder {
    fn calls(&self) -> Vec<EncodePath> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EncoderPort for ScriptedEncoder {
    async fn run(
        &self,
        invocation: &EncoderInvocation,
        _cancel: &CancellationToken,
    ) -> Result<(), MuxError> {
        self.calls.lock().unwrap().push(invocation.path);
        self.seen_args.lock().unwrap().push(invocation.args.clone());

        // A half-written file, as a crashed encoder would leave behind
        fs::write(&invocation.output_path, b"partial").unwrap();

        let fail = match invocation.path {
            EncodePath::FastPath if self.cancel_fast_path => return Err(MuxError::Cancelled),
            EncodePath::FastPath => self.fail_fast_path,
            EncodePath::ReencodePath => self.fail_reencode_path,
        };
        if fail {
            return Err(MuxError::EncoderFailed {
                path: invocation.path,
                code: Some(1),
                stderr_tail: "Conversion failed!".to_string(),
            });
        }
        fs::write(&invocation.output_path, b"muxed video").unwrap();
        Ok(())
    }
}

struct Fixture {
    work: TempDir,
    scratch: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let work = TempDir::new().unwrap();
        fs::write(work.path().join("lezione.mp4"), b"original video").unwrap();
        Self {
            work,
            scratch: TempDir::new().unwrap(),
        }
    }

    fn input(&self) -> PathBuf {
        self.work.path().join("lezione.mp4")
    }

    fn context(&self) -> JobContext {
        JobContext {
            job_id: JobId::generate(&self.input()),
            scratch_dir: self.scratch.path().join("job"),
            cancel: CancellationToken::new(),
        }
    }

    fn request(&self, output_name: &str, profile: MediaProfile) -> MuxRequest {
        let output = self.work.path().join(output_name);
        MuxRequest::new(self.input(), dual_tracks(), output, profile).unwrap()
    }

    fn work_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.work.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

fn h264_profile() -> MediaProfile {
    MediaProfile {
        video_codec: "h264".to_string(),
        audio_codec: Some("aac".to_string()),
        width: 1920,
        height: 1080,
        duration_seconds: 30.0,
        container: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
    }
}

fn dual_tracks() -> Vec<SubtitleTrack> {
    let layout = LayoutConfig::default();
    let styles = StylesConfig::default();
    let mut caption = Caption::new(0.0, 2.5, "Apriamo il terminale");
    caption.translated_text = Some("Let's open the terminal".to_string());
    vec![
        SubtitleTrack::new(
            vec![caption.clone()],
            styles.translation.resolve("en", 1080, &layout),
            TrackLane::Translation,
        ),
        SubtitleTrack::new(
            vec![caption],
            styles.source.resolve("it", 1080, &layout),
            TrackLane::Source,
        ),
    ]
}

fn muxer(encoder: Arc<ScriptedEncoder>, artifacts: ArtifactPolicy, require_burn_in: bool) -> Muxer {
    let settings = EncoderSettings {
        require_burn_in,
        ..EncoderSettings::default()
    };
    Muxer::new(encoder, SubtitleRenderer::default(), settings, artifacts)
}

fn files_in(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_fast_path_success_attaches_soft_tracks() {
    let fixture = Fixture::new();
    let encoder = Arc::new(ScriptedEncoder::default());
    let muxer = muxer(Arc::clone(&encoder), ArtifactPolicy::default(), false);
    let ctx = fixture.context();

    let result = muxer.mux(&fixture.request("out.mp4", h264_profile()), &ctx).await;

    assert!(result.success, "{:?}", result.error);
    assert!(!result.used_reencode);
    assert_eq!(encoder.calls(), vec![EncodePath::FastPath]);
    assert_eq!(fs::read(fixture.work.path().join("out.mp4")).unwrap(), b"muxed video");
    assert_eq!(fixture.work_files(), vec!["lezione.mp4", "out.mp4"]);

    let args = encoder.seen_args.lock().unwrap()[0].clone();
    assert!(args.contains(&"mov_text".to_string()));
    assert!(args.contains(&"language=en".to_string()));
    assert!(args.contains(&"language=it".to_string()));
    // Intermediate documents are removed when not kept
    assert!(result.artifacts.is_empty());
    assert_eq!(files_in(&ctx.scratch_dir), 0);
}

#[tokio::test]
async fn test_fast_path_failure_falls_back_to_reencode() {
    let fixture = Fixture::new();
    let encoder = Arc::new(ScriptedEncoder {
        fail_fast_path: true,
        ..Default::default()
    });
    let muxer = muxer(Arc::clone(&encoder), ArtifactPolicy::default(), false);

    let result = muxer
        .mux(&fixture.request("out.mp4", h264_profile()), &fixture.context())
        .await;

    assert!(result.success, "{:?}", result.error);
    assert!(result.used_reencode);
    assert_eq!(encoder.calls(), vec![EncodePath::FastPath, EncodePath::ReencodePath]);
    assert_eq!(fixture.work_files(), vec!["lezione.mp4", "out.mp4"]);

    let args = encoder.seen_args.lock().unwrap()[1].clone();
    let filter = args.iter().find(|a| a.starts_with("subtitles=")).unwrap();
    assert!(filter.ends_with(".burn.ass"));
}

#[tokio::test]
async fn test_incompatible_codec_never_attempts_fast_path() {
    let fixture = Fixture::new();
    let encoder = Arc::new(ScriptedEncoder::default());
    let muxer = muxer(Arc::clone(&encoder), ArtifactPolicy::default(), false);
    let profile = MediaProfile {
        video_codec: "prores".to_string(),
        ..h264_profile()
    };

    let result = muxer.mux(&fixture.request("out.mp4", profile), &fixture.context()).await;

    assert!(result.success);
    assert!(result.used_reencode);
    assert_eq!(encoder.calls(), vec![EncodePath::ReencodePath]);
}

#[tokio::test]
async fn test_required_burn_in_skips_fast_path() {
    let fixture = Fixture::new();
    let encoder = Arc::new(ScriptedEncoder::default());
    let muxer = muxer(Arc::clone(&encoder), ArtifactPolicy::default(), true);

    let result = muxer
        .mux(&fixture.request("out.mkv", h264_profile()), &fixture.context())
        .await;

    assert!(result.success);
    assert_eq!(encoder.calls(), vec![EncodePath::ReencodePath]);
}

#[tokio::test]
async fn test_both_paths_failing_leaves_no_output_and_input_untouched() {
    let fixture = Fixture::new();
    let encoder = Arc::new(ScriptedEncoder {
        fail_fast_path: true,
        fail_reencode_path: true,
        ..Default::default()
    });
    let muxer = muxer(Arc::clone(&encoder), ArtifactPolicy::default(), false);
    let ctx = fixture.context();

    let result = muxer.mux(&fixture.request("out.mp4", h264_profile()), &ctx).await;

    assert!(!result.success);
    assert!(result.used_reencode);
    assert!(matches!(
        result.error,
        Some(MuxError::EncoderFailed {
            path: EncodePath::ReencodePath,
            ..
        })
    ));
    // Partial files and documents are gone, the input is byte-identical
    assert_eq!(fixture.work_files(), vec!["lezione.mp4"]);
    assert_eq!(fs::read(fixture.input()).unwrap(), b"original video");
    assert_eq!(files_in(&ctx.scratch_dir), 0);
}

#[tokio::test]
async fn test_failure_retains_documents_when_asked() {
    let fixture = Fixture::new();
    let encoder = Arc::new(ScriptedEncoder {
        fail_fast_path: true,
        fail_reencode_path: true,
        ..Default::default()
    });
    let policy = ArtifactPolicy {
        keep_on_success: false,
        keep_on_failure: true,
    };
    let muxer = muxer(encoder, policy, false);

    let result = muxer
        .mux(&fixture.request("out.mp4", h264_profile()), &fixture.context())
        .await;

    assert!(!result.success);
    // Two fast path documents plus the burn-in document
    assert_eq!(result.artifacts.len(), 3);
    assert!(result.artifacts.iter().all(|p| p.exists()));
    assert_eq!(fixture.work_files(), vec!["lezione.mp4"]);
}

#[tokio::test]
async fn test_keep_artifacts_on_success() {
    let fixture = Fixture::new();
    let encoder = Arc::new(ScriptedEncoder::default());
    let policy = ArtifactPolicy {
        keep_on_success: true,
        keep_on_failure: false,
    };
    let muxer = muxer(encoder, policy, false);

    let result = muxer
        .mux(&fixture.request("out.mkv", h264_profile()), &fixture.context())
        .await;

    assert!(result.success);
    assert_eq!(result.artifacts.len(), 2);
    for artifact in &result.artifacts {
        let content = fs::read_to_string(artifact).unwrap();
        assert!(content.contains("[Script Info]"));
    }
}

#[tokio::test]
async fn test_cancellation_is_terminal() {
    let fixture = Fixture::new();
    let encoder = Arc::new(ScriptedEncoder {
        cancel_fast_path: true,
        ..Default::default()
    });
    let muxer = muxer(Arc::clone(&encoder), ArtifactPolicy::default(), false);

    let result = muxer
        .mux(&fixture.request("out.mp4", h264_profile()), &fixture.context())
        .await;

    assert!(!result.success);
    assert_eq!(result.error, Some(MuxError::Cancelled));
    assert_eq!(encoder.calls(), vec![EncodePath::FastPath]);
    assert_eq!(fixture.work_files(), vec!["lezione.mp4"]);
}

#[tokio::test]
async fn test_cancelled_before_start_runs_nothing() {
    let fixture = Fixture::new();
    let encoder = Arc::new(ScriptedEncoder::default());
    let muxer = muxer(Arc::clone(&encoder), ArtifactPolicy::default(), false);
    let ctx = fixture.context();
    ctx.cancel.cancel();

    let result = muxer.mux(&fixture.request("out.mp4", h264_profile()), &ctx).await;

    assert_eq!(result.error, Some(MuxError::Cancelled));
    assert!(encoder.calls().is_empty());
}
