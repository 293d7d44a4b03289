//! Error handling module for bisub

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::errors::*;

/// Pipeline stage, used to report where a job stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Setup,
    Probe,
    Transcribe,
    Segment,
    Translate,
    Render,
    Mux,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Setup => "setup",
            Stage::Probe => "probe",
            Stage::Transcribe => "transcribe",
            Stage::Segment => "segment",
            Stage::Translate => "translate",
            Stage::Render => "render",
            Stage::Mux => "mux",
        };
        f.write_str(name)
    }
}

/// Main error type for bisub operations
#[derive(Error, Debug)]
pub enum BisubError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Mux(#[from] MuxError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("job cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BisubError {
    /// Stage an error originates from when raised on its own
    pub fn stage(&self) -> Stage {
        match self {
            BisubError::Probe(_) => Stage::Probe,
            BisubError::Transcription(_) => Stage::Transcribe,
            BisubError::Render(_) => Stage::Render,
            BisubError::Mux(_) => Stage::Mux,
            BisubError::Config(_) | BisubError::Io(_) | BisubError::Cancelled => Stage::Setup,
        }
    }
}

/// A job-level failure and the stage it happened in
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: BisubError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: impl Into<BisubError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.source,
            BisubError::Cancelled
                | BisubError::Mux(MuxError::Cancelled)
                | BisubError::Transcription(TranscriptionError::Cancelled)
        )
    }
}

impl From<BisubError> for PipelineError {
    fn from(err: BisubError) -> Self {
        Self {
            stage: err.stage(),
            source: err,
        }
    }
}

/// Result type alias for bisub operations
pub type BisubResult<T> = std::result::Result<T, BisubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_follows_error_kind() {
        let err: PipelineError = BisubError::from(ProbeError::NoVideoStream {
            path: "a.mp4".to_string(),
        })
        .into();
        assert_eq!(err.stage, Stage::Probe);
        assert_eq!(err.to_string(), "probe stage failed: no video stream found in a.mp4");
    }

    #[test]
    fn test_cancellation_is_recognised_in_any_stage() {
        assert!(PipelineError::new(Stage::Mux, MuxError::Cancelled).is_cancelled());
        assert!(
            PipelineError::new(Stage::Transcribe, TranscriptionError::Cancelled).is_cancelled()
        );
        assert!(!PipelineError::new(Stage::Mux, MuxError::EmptyOutput("x".into())).is_cancelled());
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Stage::Transcribe).unwrap(), "\"transcribe\"");
    }
}
