// Domain rules - Encode path selection and codec/container compatibility

use crate::domain::model::*;

/// Business rules for choosing between stream copy and a full re-encode
pub struct EncodePathSelector;

impl EncodePathSelector {
    /// Pick the encode path for a probed input and target container.
    ///
    /// `FastPath` is only chosen when nothing forces a transcode: the video and
    /// audio codecs can be copied into the target container, the container can
    /// carry a soft subtitle stream, and burn-in is not required.
    pub fn decide(profile: &MediaProfile, target: &Container, require_burn_in: bool) -> EncodePath {
        if require_burn_in {
            return EncodePath::ReencodePath;
        }
        if Self::fast_path_blocker(profile, target).is_some() {
            return EncodePath::ReencodePath;
        }
        EncodePath::FastPath
    }

    /// Reason the fast path is impossible, if any
    pub fn fast_path_blocker(profile: &MediaProfile, target: &Container) -> Option<String> {
        if SubtitleCodec::for_container(target).is_none() {
            return Some(format!("{:?} cannot carry a soft subtitle stream", target));
        }
        if !Self::video_copy_compatible(&profile.video_codec, target) {
            return Some(format!(
                "video codec '{}' cannot be stream-copied into {:?}",
                profile.video_codec, target
            ));
        }
        if let Some(audio) = &profile.audio_codec {
            if !Self::audio_copy_compatible(audio, target) {
                return Some(format!(
                    "audio codec '{}' cannot be stream-copied into {:?}",
                    audio, target
                ));
            }
        }
        None
    }

    /// Whether soft subtitle streams lose the stacked dual-track layout.
    ///
    /// Soft streams are shown one at a time by players, and mov_text also
    /// drops font, colour and margin, so stacking survives only burn-in.
    pub fn loses_stacking(path: EncodePath, track_count: usize) -> bool {
        path == EncodePath::FastPath && track_count > 1
    }

    /// Check if a video codec can be copied into the container without transcoding
    pub fn video_copy_compatible(codec: &str, target: &Container) -> bool {
        let codec = codec.to_lowercase();
        match target {
            Container::Mp4 | Container::Mov => {
                matches!(codec.as_str(), "h264" | "hevc" | "av1" | "mpeg4")
            }
            Container::Mkv => matches!(
                codec.as_str(),
                "h264" | "hevc" | "av1" | "vp8" | "vp9" | "mpeg4" | "mpeg2video"
            ),
            Container::Webm => matches!(codec.as_str(), "vp8" | "vp9" | "av1"),
            Container::Other(_) => false,
        }
    }

    /// Check if an audio codec can be copied into the container without transcoding
    pub fn audio_copy_compatible(codec: &str, target: &Container) -> bool {
        let codec = codec.to_lowercase();
        match target {
            Container::Mp4 | Container::Mov => {
                matches!(codec.as_str(), "aac" | "mp3" | "ac3" | "eac3" | "alac")
            }
            Container::Mkv => {
                matches!(
                    codec.as_str(),
                    "aac" | "mp3" | "ac3" | "eac3" | "opus" | "vorbis" | "flac"
                ) || codec.starts_with("pcm_")
            }
            Container::Webm => matches!(codec.as_str(), "opus" | "vorbis"),
            Container::Other(_) => false,
        }
    }
}

/// Soft subtitle stream codec used on the fast path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleCodec {
    /// 3GPP timed text, fed from SRT documents
    MovText,
    /// Styled timed text, fed from ASS documents
    Ass,
}

impl SubtitleCodec {
    /// Subtitle codec the container can carry, if any
    pub fn for_container(target: &Container) -> Option<Self> {
        match target {
            Container::Mp4 | Container::Mov => Some(SubtitleCodec::MovText),
            Container::Mkv => Some(SubtitleCodec::Ass),
            Container::Webm | Container::Other(_) => None,
        }
    }

    /// Encoder name passed to `-c:s`
    pub fn encoder_name(&self) -> &'static str {
        match self {
            SubtitleCodec::MovText => "mov_text",
            SubtitleCodec::Ass => "ass",
        }
    }

    /// File extension of the intermediate document fed to the encoder
    pub fn document_extension(&self) -> &'static str {
        match self {
            SubtitleCodec::MovText => "srt",
            SubtitleCodec::Ass => "ass",
        }
    }
}
