//! Pipeline configuration
//!
//! One immutable [`PipelineConfig`] is built at startup (defaults, then the
//! TOML file, then `BISUB_*` environment variables, then CLI flags) and passed
//! explicitly to every stage. Nothing reads configuration from global state.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::model::{Rgba, SubtitleStyle};
use crate::utils::retry::RetryPolicy;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub segmentation: SegmentationConfig,
    pub styles: StylesConfig,
    pub layout: LayoutConfig,
    pub encoder: EncoderSettings,
    pub concurrency: ConcurrencyConfig,
    pub retry: RetryPolicy,
    pub transcription: TranscriptionConfig,
    pub translation: TranslationConfig,
    pub scratch: ScratchConfig,
}

impl PipelineConfig {
    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let seg = &self.segmentation;
        if seg.max_chars_per_line == 0 {
            return Err(invalid("segmentation.max_chars_per_line", "must be at least 1"));
        }
        if seg.max_lines_per_caption == 0 {
            return Err(invalid("segmentation.max_lines_per_caption", "must be at least 1"));
        }
        if !(seg.min_duration_seconds.is_finite() && seg.min_duration_seconds >= 0.0) {
            return Err(invalid(
                "segmentation.min_duration_seconds",
                "must be a non-negative number",
            ));
        }
        if !(self.layout.line_spacing_factor >= 1.0) {
            return Err(invalid("layout.line_spacing_factor", "must be >= 1.0"));
        }
        if !(0.0..0.5).contains(&self.layout.base_margin_ratio) {
            return Err(invalid("layout.base_margin_ratio", "must be in [0.0, 0.5)"));
        }
        if self.layout.reference_height == 0 {
            return Err(invalid("layout.reference_height", "must be at least 1"));
        }
        for (key, style) in [
            ("styles.source", &self.styles.source),
            ("styles.translation", &self.styles.translation),
        ] {
            if style.font_size_pt == 0 {
                return Err(invalid(&format!("{}.font_size_pt", key), "must be at least 1"));
            }
        }
        if self.encoder.crf > 51 {
            return Err(invalid("encoder.crf", "cannot exceed 51"));
        }
        let factor = self.encoder.timeout_factor;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(invalid("encoder.timeout_factor", "must be a positive finite number"));
        }
        if self.concurrency.max_jobs == Some(0) {
            return Err(invalid("concurrency.max_jobs", "must be at least 1"));
        }
        if self.concurrency.max_network_calls == 0 {
            return Err(invalid("concurrency.max_network_calls", "must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.translation.retry.max_attempts == 0 {
            return Err(invalid("translation.retry.max_attempts", "must be at least 1"));
        }
        if self.translation.timeout_secs == 0 {
            return Err(invalid("translation.timeout_secs", "must be at least 1"));
        }
        if self.transcription.program.trim().is_empty() {
            return Err(invalid("transcription.program", "cannot be empty"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Caption segmentation budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub max_chars_per_line: usize,
    pub min_duration_seconds: f64,
    /// One line by default: two simultaneous tracks already use the vertical space
    pub max_lines_per_caption: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_chars_per_line: 42,
            min_duration_seconds: 0.8,
            max_lines_per_caption: 1,
        }
    }
}

/// Per-track style defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    pub source: StyleConfig,
    pub translation: StyleConfig,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            source: StyleConfig {
                font_name: "Inter".to_string(),
                font_size_pt: 44,
                color: Rgba::WHITE,
            },
            translation: StyleConfig {
                font_name: "Inter".to_string(),
                font_size_pt: 44,
                color: Rgba::YELLOW,
            },
        }
    }
}

/// Font and colour of one track, with the font size given for a 1080-line frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    pub font_name: String,
    pub font_size_pt: u32,
    pub color: Rgba,
}

impl StyleConfig {
    /// Resolve into a concrete style for a frame of the given height
    pub fn resolve(
        &self,
        language_tag: &str,
        frame_height: u32,
        layout: &LayoutConfig,
    ) -> SubtitleStyle {
        SubtitleStyle {
            track_language_tag: language_tag.to_string(),
            font_name: self.font_name.clone(),
            font_size_pt: layout.scale_font(self.font_size_pt, frame_height),
            vertical_margin_px: layout.base_margin_px(frame_height),
            color: self.color,
        }
    }
}

/// On-screen placement parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Bottom margin of the lowest track, as a fraction of frame height
    pub base_margin_ratio: f64,
    /// Line height as a multiple of the font size
    pub line_spacing_factor: f64,
    /// Frame height the configured font sizes are expressed for
    pub reference_height: u32,
    /// Horizontal margins in script pixels
    pub margin_h_px: u32,
    /// Place the translation on the lowest line and the source above it
    pub translation_on_bottom: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_margin_ratio: 0.05,
            line_spacing_factor: 1.25,
            reference_height: 1080,
            margin_h_px: 40,
            translation_on_bottom: true,
        }
    }
}

impl LayoutConfig {
    pub fn base_margin_px(&self, frame_height: u32) -> u32 {
        (frame_height as f64 * self.base_margin_ratio).round() as u32
    }

    pub fn scale_font(&self, font_size_pt: u32, frame_height: u32) -> u32 {
        let scaled = font_size_pt as f64 * frame_height as f64 / self.reference_height as f64;
        (scaled.round() as u32).max(1)
    }
}

/// External encoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub preset: String,
    pub crf: u8,
    /// Encoder wall-clock budget per second of input
    pub timeout_factor: f64,
    pub min_timeout_secs: u64,
    /// Always burn subtitles into the pixels, even when stream copy is possible
    pub require_burn_in: bool,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "160k".to_string(),
            preset: "medium".to_string(),
            crf: 20,
            timeout_factor: 4.0,
            min_timeout_secs: 120,
            require_burn_in: false,
        }
    }
}

impl EncoderSettings {
    /// Wall-clock timeout for one encoder run over an input of the given length
    pub fn timeout_for(&self, duration_seconds: f64) -> Duration {
        let scaled = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds * self.timeout_factor
        } else {
            0.0
        };
        let seconds = scaled.max(self.min_timeout_secs as f64);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

/// Concurrency limits across jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Concurrent pipeline jobs; defaults to the number of CPU cores
    pub max_jobs: Option<usize>,
    /// Concurrent transcription/translation calls across all jobs
    pub max_network_calls: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_jobs: None,
            max_network_calls: 4,
        }
    }
}

impl ConcurrencyConfig {
    pub fn effective_max_jobs(&self) -> usize {
        self.max_jobs.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// External speech-to-text command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub program: String,
    /// Arguments; `{input}`, `{output_dir}` and `{language}` are substituted
    pub args: Vec<String>,
    /// Exit code the command uses to report unreadable media
    pub unreadable_exit_code: i32,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            program: "whisper".to_string(),
            args: vec![
                "{input}".to_string(),
                "--language".to_string(),
                "{language}".to_string(),
                "--output_format".to_string(),
                "srt".to_string(),
                "--output_dir".to_string(),
                "{output_dir}".to_string(),
            ],
            unreadable_exit_code: 2,
        }
    }
}

/// External translation command. Source text goes to stdin, translation comes from stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// No program means captions are not translated
    pub program: Option<String>,
    /// Arguments; `{source_lang}` and `{target_lang}` are substituted
    pub args: Vec<String>,
    /// Wall-clock budget for one caption
    pub timeout_secs: u64,
    /// Per-caption retries before falling back to the source text
    pub retry: RetryPolicy,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            timeout_secs: 30,
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay_ms: 250,
                factor: 2.0,
                max_delay_ms: 2_000,
            },
        }
    }
}

impl TranslationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Scratch space for intermediate artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    pub root: PathBuf,
    /// Keep intermediate subtitle documents after a successful job
    pub keep_artifacts: bool,
    /// Keep the job's scratch directory when the job fails
    pub retain_on_failure: bool,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("bisub"),
            keep_artifacts: false,
            retain_on_failure: true,
        }
    }
}
