// Domain errors - Error types for each pipeline stage

use thiserror::Error;

use crate::domain::model::EncodePath;

/// Errors raised while inspecting an input video
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// The file is missing, unreadable, or not a media container ffprobe understands
    #[error("unreadable media {path}: {reason}")]
    Unreadable { path: String, reason: String },

    /// The container parsed but carries no video stream
    #[error("no video stream found in {path}")]
    NoVideoStream { path: String },
}

/// Errors for a single transcript segment. Always recoverable: the segment is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("segment {index} has non-positive duration ({start:.3}s -> {end:.3}s)")]
    NonPositiveDuration { index: usize, start: f64, end: f64 },
}

/// Errors reported by the speech-to-text collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscriptionError {
    /// The collaborator could not read the media. Permanent.
    #[error("transcription could not read media: {0}")]
    UnreadableMedia(String),

    /// Network or service failure. Transient, retried with backoff.
    #[error("transcription service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The collaborator answered but its output could not be parsed
    #[error("malformed transcript: {0}")]
    MalformedTranscript(String),

    #[error("transcription cancelled")]
    Cancelled,
}

impl TranscriptionError {
    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, TranscriptionError::ServiceUnavailable(_))
    }
}

/// Errors reported by the translation collaborator. The pipeline fails open on all of them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    #[error("translator failed: {0}")]
    Failed(String),

    #[error("translator returned an empty result")]
    EmptyResult,

    #[error("translator exceeded its {0}s timeout")]
    Timeout(u64),

    #[error("translation cancelled")]
    Cancelled,
}

impl TranslationError {
    /// Whether a retry may succeed. An empty answer will not change on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, TranslationError::Failed(_) | TranslationError::Timeout(_))
    }
}

/// Errors produced while muxing subtitles into the output video
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MuxError {
    #[error("invalid mux request: {0}")]
    InvalidRequest(String),

    #[error("failed to launch encoder: {0}")]
    Spawn(String),

    #[error("encoder exited with status {code:?} on {path}: {stderr_tail}")]
    EncoderFailed {
        path: EncodePath,
        code: Option<i32>,
        stderr_tail: String,
    },

    #[error("encoder exceeded its {seconds}s timeout on {path}")]
    Timeout { path: EncodePath, seconds: u64 },

    #[error("encoder produced no output at {0}")]
    EmptyOutput(String),

    #[error("I/O error during mux: {0}")]
    Io(String),

    #[error("mux cancelled")]
    Cancelled,
}

impl From<std::io::Error> for MuxError {
    fn from(err: std::io::Error) -> Self {
        MuxError::Io(err.to_string())
    }
}

/// Errors from building, parsing or editing subtitle documents
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("no style named '{0}' in document")]
    UnknownTrack(String),

    #[error("malformed subtitle document at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}
