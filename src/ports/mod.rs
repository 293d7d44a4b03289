// Ports - Interface definitions (contracts) for the external collaborators

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a media file and return its container and codec facts
    async fn probe(&self, path: &Path) -> Result<MediaProfile, ProbeError>;
}

/// Port for speech-to-text
#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    /// Transcribe the audio of a media file into raw timed segments
    async fn transcribe(
        &self,
        path: &Path,
        language_hint: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranscriptSegment>, TranscriptionError>;
}

/// Port for caption translation
#[async_trait]
pub trait TranslatorPort: Send + Sync {
    /// Translate one caption's text. Returns `Cancelled` promptly once `cancel` fires.
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TranslationError>;
}

/// One fully-prepared encoder run
#[derive(Debug, Clone)]
pub struct EncoderInvocation {
    /// Encoder arguments, program name excluded
    pub args: Vec<String>,
    /// Where this run writes its output
    pub output_path: PathBuf,
    pub timeout: Duration,
    pub path: EncodePath,
}

/// Port for running the external encoder
#[async_trait]
pub trait EncoderPort: Send + Sync {
    /// Run the encoder to completion. Success means a zero exit status;
    /// checking the produced file is the caller's job.
    async fn run(
        &self,
        invocation: &EncoderInvocation,
        cancel: &CancellationToken,
    ) -> Result<(), MuxError>;
}
