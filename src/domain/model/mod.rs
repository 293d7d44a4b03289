// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::errors::MuxError;

/// Container and codec facts about an input video, produced once by the probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaProfile {
    pub video_codec: String,
    pub audio_codec: Option<String>,
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
    /// Format name as reported by the prober (e.g. "mov,mp4,m4a,3gp,3g2,mj2")
    pub container: String,
}

impl MediaProfile {
    /// Whether the input carries an audio stream
    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }
}

/// One raw speech-to-text segment. May be long and is not display-sized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(alias = "start")]
    pub start_seconds: f64,
    #[serde(alias = "end")]
    pub end_seconds: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// One screen-sized, timed unit of subtitle text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub source_text: String,
    pub translated_text: Option<String>,
}

impl Caption {
    pub fn new(start_seconds: f64, end_seconds: f64, source_text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            source_text: source_text.into(),
            translated_text: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// Text shown for the given lane. A missing translation shows the source text.
    pub fn text_for(&self, lane: TrackLane) -> &str {
        match lane {
            TrackLane::Source => &self.source_text,
            TrackLane::Translation => self
                .translated_text
                .as_deref()
                .unwrap_or(&self.source_text),
        }
    }
}

/// RGBA colour with `a = 255` meaning fully opaque
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::opaque(0xFF, 0xFF, 0xFF);
    pub const YELLOW: Rgba = Rgba::opaque(0xFF, 0xE6, 0x5C);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`
    pub fn parse_hex(value: &str) -> Result<Self, String> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid colour '{}': bad hex digits", value));
        }
        if hex.len() != 6 && hex.len() != 8 {
            return Err(format!("invalid colour '{}': expected #RRGGBB or #RRGGBBAA", value));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("invalid colour '{}': bad hex digits", value))
        };
        let a = if hex.len() == 8 { byte(6)? } else { 0xFF };
        Ok(Self {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a,
        })
    }

    /// ASS colour literal `&HAABBGGRR` where alpha 00 is opaque
    pub fn to_ass(&self) -> String {
        format!(
            "&H{:02X}{:02X}{:02X}{:02X}",
            0xFF - self.a,
            self.b,
            self.g,
            self.r
        )
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::parse_hex(&value)
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        format!("#{:02X}{:02X}{:02X}{:02X}", value.r, value.g, value.b, value.a)
    }
}

/// Visual style for one language track
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStyle {
    pub track_language_tag: String,
    pub font_name: String,
    pub font_size_pt: u32,
    /// Distance of the track's bottom line from the frame's bottom edge
    pub vertical_margin_px: u32,
    pub color: Rgba,
}

/// Which caption text a track displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackLane {
    Source,
    Translation,
}

/// Ordered captions plus the style they are shown with
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleTrack {
    pub captions: Vec<Caption>,
    pub style: SubtitleStyle,
    pub lane: TrackLane,
}

impl SubtitleTrack {
    pub fn new(captions: Vec<Caption>, style: SubtitleStyle, lane: TrackLane) -> Self {
        Self {
            captions,
            style,
            lane,
        }
    }

    pub fn language(&self) -> &str {
        &self.style.track_language_tag
    }

    /// Largest number of rendered lines in any caption of the track
    pub fn max_lines(&self) -> usize {
        self.captions
            .iter()
            .map(|c| c.text_for(self.lane).lines().count().max(1))
            .max()
            .unwrap_or(1)
    }
}

/// How the encoder produces the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodePath {
    /// Stream-copy video and audio, attach subtitles as soft streams
    FastPath,
    /// Burn subtitles into the pixels and transcode to H.264/AAC
    ReencodePath,
}

impl fmt::Display for EncodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodePath::FastPath => write!(f, "fast path"),
            EncodePath::ReencodePath => write!(f, "re-encode path"),
        }
    }
}

/// Output container, inferred from the output file extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    Mp4,
    Mov,
    Mkv,
    Webm,
    Other(String),
}

impl Container {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "mp4" | "m4v" => Container::Mp4,
            "mov" => Container::Mov,
            "mkv" => Container::Mkv,
            "webm" => Container::Webm,
            _ => Container::Other(ext),
        }
    }

    /// Whether `-movflags +faststart` applies
    pub fn is_isobmff(&self) -> bool {
        matches!(self, Container::Mp4 | Container::Mov)
    }
}

/// Everything the muxer needs for one output
#[derive(Debug, Clone)]
pub struct MuxRequest {
    pub input_video_path: PathBuf,
    pub subtitle_tracks: Vec<SubtitleTrack>,
    pub output_path: PathBuf,
    pub profile: MediaProfile,
}

impl MuxRequest {
    /// Create new mux request with validation
    pub fn new(
        input_video_path: PathBuf,
        subtitle_tracks: Vec<SubtitleTrack>,
        output_path: PathBuf,
        profile: MediaProfile,
    ) -> Result<Self, MuxError> {
        if subtitle_tracks.is_empty() || subtitle_tracks.len() > 2 {
            return Err(MuxError::InvalidRequest(format!(
                "expected 1 or 2 subtitle tracks, got {}",
                subtitle_tracks.len()
            )));
        }
        if input_video_path == output_path {
            return Err(MuxError::InvalidRequest(
                "output path must differ from the input video".to_string(),
            ));
        }
        Ok(Self {
            input_video_path,
            subtitle_tracks,
            output_path,
            profile,
        })
    }
}

/// Outcome of a mux attempt chain
#[derive(Debug, Clone)]
pub struct MuxResult {
    pub success: bool,
    pub output_path: PathBuf,
    pub used_reencode: bool,
    pub error: Option<MuxError>,
    /// Intermediate subtitle documents left on disk for inspection
    pub artifacts: Vec<PathBuf>,
}

impl MuxResult {
    pub fn succeeded(output_path: PathBuf, used_reencode: bool) -> Self {
        Self {
            success: true,
            output_path,
            used_reencode,
            error: None,
            artifacts: Vec::new(),
        }
    }

    pub fn failed(output_path: PathBuf, used_reencode: bool, error: MuxError) -> Self {
        Self {
            success: false,
            output_path,
            used_reencode,
            error: Some(error),
            artifacts: Vec::new(),
        }
    }
}

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for one pipeline run, safe to use as a directory name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Generate an id from the input file name, the current time and a process-wide counter
    pub fn generate(input: &Path) -> Self {
        let stem: String = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "job".to_string())
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .take(40)
            .collect();
        let seq = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "{}-{}-{}-{:04}",
            stem,
            chrono::Utc::now().format("%Y%m%dT%H%M%S"),
            std::process::id(),
            seq
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests;
