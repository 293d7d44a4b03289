//! bisub - dual-language subtitles for tutorial videos
//!
//! Transcribes a video's spoken language, splits the transcript into
//! display-sized captions, translates them, renders both languages as stacked
//! ASS tracks and muxes them into a new video. Stream copy with soft
//! subtitles is tried first; re-encoding with burned-in subtitles is the
//! fallback.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod segmenter;
pub mod subtitles;
pub mod utils;

// Re-export commonly used types
pub use app::{BatchInteractor, DefaultAppContainer, JobReport, JobRequest, PipelineInteractor};
pub use config::PipelineConfig;
pub use domain::errors::{MuxError, ProbeError, RenderError, TranscriptionError, TranslationError};
pub use domain::model::{
    Caption, MediaProfile, MuxRequest, MuxResult, SubtitleTrack, TranscriptSegment,
};
pub use engine::Muxer;
pub use error::{BisubError, BisubResult, PipelineError, Stage};
pub use segmenter::CaptionSegmenter;
pub use subtitles::{SubtitleDocument, SubtitleRenderer};
