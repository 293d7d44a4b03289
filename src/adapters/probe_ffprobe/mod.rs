//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe -print_format json -show_format -show_streams` and reduces the
//! answer to a [`MediaProfile`].

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::errors::ProbeError;
use crate::domain::model::MediaProfile;
use crate::ports::ProbePort;

/// FFprobe-based probe adapter
pub struct FfprobeProbe {
    ffprobe_path: String,
}

impl FfprobeProbe {
    /// Create new FFprobe adapter using the given executable
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

#[async_trait]
impl ProbePort for FfprobeProbe {
    async fn probe(&self, path: &Path) -> Result<MediaProfile, ProbeError> {
        let shown = path.display().to_string();
        if !path.is_file() {
            return Err(ProbeError::Unreadable {
                path: shown,
                reason: "file does not exist".to_string(),
            });
        }

        debug!("Probing {} with {}", shown, self.ffprobe_path);
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProbeError::Unreadable {
                path: shown.clone(),
                reason: format!("failed to run {}: {}", self.ffprobe_path, e),
            })?;

        if !output.status.success() {
            return Err(ProbeError::Unreadable {
                path: shown,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let json = String::from_utf8_lossy(&output.stdout);
        let profile = parse_ffprobe_json(&json, &shown)?;
        info!(
            "Probed {}: {} {}x{}, audio {}, {:.2}s",
            shown,
            profile.video_codec,
            profile.width,
            profile.height,
            profile.audio_codec.as_deref().unwrap_or("none"),
            profile.duration_seconds
        );
        Ok(profile)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    #[serde(default)]
    disposition: FfprobeDisposition,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    attached_pic: u8,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

/// Reduce ffprobe's JSON answer to a media profile.
///
/// Cover art (`attached_pic`) does not count as a video stream. The format
/// duration wins over the stream duration when both are present.
pub fn parse_ffprobe_json(json: &str, path: &str) -> Result<MediaProfile, ProbeError> {
    let parsed: FfprobeOutput = serde_json::from_str(json).map_err(|e| ProbeError::Unreadable {
        path: path.to_string(),
        reason: format!("unexpected ffprobe output: {}", e),
    })?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video") && s.disposition.attached_pic == 0)
        .ok_or_else(|| ProbeError::NoVideoStream {
            path: path.to_string(),
        })?;
    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(ProbeError::Unreadable {
                path: path.to_string(),
                reason: "video stream has no frame size".to_string(),
            })
        }
    };

    let format_duration = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());
    let stream_duration = video.duration.as_deref().and_then(|d| d.parse::<f64>().ok());
    let duration_seconds = format_duration
        .or(stream_duration)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    Ok(MediaProfile {
        video_codec: video.codec_name.clone().unwrap_or_else(|| "unknown".to_string()),
        audio_codec: audio.and_then(|a| a.codec_name.clone()),
        width,
        height,
        duration_seconds,
        container: parsed
            .format
            .and_then(|f| f.format_name)
            .unwrap_or_default(),
    })
}
