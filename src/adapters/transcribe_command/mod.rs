//! Speech-to-text through an external command (a whisper-style CLI)
//!
//! The command writes an `.srt` or `.json` transcript into a scratch output
//! directory, which is parsed back into [`TranscriptSegment`]s.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapters::exec_ffmpeg::stderr_tail;
use crate::config::TranscriptionConfig;
use crate::domain::errors::TranscriptionError;
use crate::domain::model::TranscriptSegment;
use crate::ports::TranscriptionPort;
use crate::subtitles::parse_srt;

/// Transcriber that shells out to a configured command
pub struct CommandTranscriber {
    config: TranscriptionConfig,
}

impl CommandTranscriber {
    /// Create new transcriber from configuration
    pub fn new(config: TranscriptionConfig) -> Self {
        Self { config }
    }

    fn build_args(&self, input: &Path, language: &str, output_dir: &Path) -> Vec<String> {
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input.to_string_lossy())
                    .replace("{language}", language)
                    .replace("{output_dir}", &output_dir.to_string_lossy())
            })
            .collect()
    }
}

#[async_trait]
impl TranscriptionPort for CommandTranscriber {
    async fn transcribe(
        &self,
        path: &Path,
        language_hint: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranscriptSegment>, TranscriptionError> {
        if !path.is_file() {
            return Err(TranscriptionError::UnreadableMedia(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let output_dir = tempfile::Builder::new()
            .prefix("bisub-transcript-")
            .tempdir()
            .map_err(|e| TranscriptionError::ServiceUnavailable(format!("scratch dir: {}", e)))?;
        let args = self.build_args(path, language_hint, output_dir.path());
        info!("Transcribing {} ({})", path.display(), language_hint);
        debug!("{} {}", self.config.program, args.join(" "));

        let child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let reason = format!("failed to run {}: {}", self.config.program, e);
                TranscriptionError::ServiceUnavailable(reason)
            })?;

        // Dropping the pending future kills the child
        let output = tokio::select! {
            output = child.wait_with_output() => output.map_err(|e| {
                let reason = format!("{} failed: {}", self.config.program, e);
                TranscriptionError::ServiceUnavailable(reason)
            })?,
            _ = cancel.cancelled() => return Err(TranscriptionError::Cancelled),
        };

        if !output.status.success() {
            let stderr = stderr_tail(&String::from_utf8_lossy(&output.stderr), 5);
            return match output.status.code() {
                Some(code) if code == self.config.unreadable_exit_code => {
                    Err(TranscriptionError::UnreadableMedia(stderr))
                }
                code => {
                    warn!("{} exited with {:?}", self.config.program, code);
                    Err(TranscriptionError::ServiceUnavailable(format!(
                        "{} exited with {:?}: {}",
                        self.config.program, code, stderr
                    )))
                }
            };
        }

        let transcript = find_transcript(output_dir.path()).ok_or_else(|| {
            TranscriptionError::MalformedTranscript(format!(
                "{} produced no .srt or .json transcript",
                self.config.program
            ))
        })?;
        let segments = read_transcript(&transcript)?;
        info!("Transcribed {} segments", segments.len());
        Ok(segments)
    }
}

fn find_transcript(dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| matches!(extension_of(p).as_deref(), Some("srt") | Some("json")))
        .collect();
    // Prefer SRT when a tool writes both
    candidates.sort_by_key(|p| (extension_of(p).as_deref() != Some("srt"), p.clone()));
    candidates.into_iter().next()
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Read a transcript file, `.json` or `.srt` by extension
pub fn read_transcript(path: &Path) -> Result<Vec<TranscriptSegment>, TranscriptionError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        TranscriptionError::MalformedTranscript(format!("cannot read {}: {}", path.display(), e))
    })?;
    match extension_of(path).as_deref() {
        Some("json") => parse_transcript_json(&content),
        _ => parse_srt(&content)
            .map_err(|e| TranscriptionError::MalformedTranscript(e.to_string())),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptJson {
    Segments(Vec<TranscriptSegment>),
    Wrapped { segments: Vec<TranscriptSegment> },
}

/// Parse a JSON transcript: either `[{start, end, text}]` or whisper's `{"segments": [...]}`
pub fn parse_transcript_json(content: &str) -> Result<Vec<TranscriptSegment>, TranscriptionError> {
    let parsed: TranscriptJson = serde_json::from_str(content)
        .map_err(|e| {
            TranscriptionError::MalformedTranscript(format!("invalid transcript JSON: {}", e))
        })?;
    let segments = match parsed {
        TranscriptJson::Segments(segments) | TranscriptJson::Wrapped { segments } => segments,
    };
    if let Some((index, bad)) = segments
        .iter()
        .enumerate()
        .find(|(_, s)| !(s.start_seconds.is_finite() && s.end_seconds.is_finite()))
    {
        return Err(TranscriptionError::MalformedTranscript(format!(
            "segment {} has non-finite timing ({} -> {})",
            index, bad.start_seconds, bad.end_seconds
        )));
    }
    Ok(segments)
}
