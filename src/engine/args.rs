//! Encoder argument lists for both encode paths

use std::path::{Path, PathBuf};

use crate::config::EncoderSettings;
use crate::domain::model::Container;
use crate::domain::rules::SubtitleCodec;
use crate::utils::path::escape_filter_path;

/// A subtitle document attached as its own stream
#[derive(Debug, Clone)]
pub struct SubtitleInput {
    pub path: PathBuf,
    pub language: String,
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Stream-copy video and audio and attach each document as a soft subtitle stream
pub fn fast_path_args(
    input: &Path,
    subtitles: &[SubtitleInput],
    codec: SubtitleCodec,
    has_audio: bool,
    target: &Container,
    output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-nostdin".into(), "-i".into(), lossy(input)];
    for subtitle in subtitles {
        args.push("-i".into());
        args.push(lossy(&subtitle.path));
    }

    args.extend(["-map".into(), "0:v:0".into()]);
    if has_audio {
        args.extend(["-map".into(), "0:a:0".into()]);
    }
    for i in 0..subtitles.len() {
        args.extend(["-map".into(), format!("{}:0", i + 1)]);
    }

    args.extend(["-c:v".into(), "copy".into()]);
    if has_audio {
        args.extend(["-c:a".into(), "copy".into()]);
    }
    args.extend(["-c:s".into(), codec.encoder_name().into()]);

    for (i, subtitle) in subtitles.iter().enumerate() {
        args.push(format!("-metadata:s:s:{}", i));
        args.push(format!("language={}", subtitle.language));
    }
    if !subtitles.is_empty() {
        args.extend(["-disposition:s:0".into(), "default".into()]);
    }
    if target.is_isobmff() {
        args.extend(["-movflags".into(), "+faststart".into()]);
    }
    args.push(lossy(output));
    args
}

/// Burn the rendered document into the frames and transcode
pub fn reencode_args(
    input: &Path,
    document: &Path,
    settings: &EncoderSettings,
    has_audio: bool,
    target: &Container,
    output: &Path,
) -> Vec<String> {
    let (video_codec, audio_codec) = match target {
        // H.264/AAC cannot be stored in WebM
        Container::Webm => ("libvpx-vp9", "libopus"),
        _ => (settings.video_codec.as_str(), settings.audio_codec.as_str()),
    };

    let mut args: Vec<String> = vec!["-y".into(), "-nostdin".into(), "-i".into(), lossy(input)];
    args.extend(["-map".into(), "0:v:0".into()]);
    if has_audio {
        args.extend(["-map".into(), "0:a:0".into()]);
    }
    args.extend([
        "-vf".into(),
        format!("subtitles={}", escape_filter_path(document)),
        "-c:v".into(),
        video_codec.into(),
    ]);
    if video_codec == "libx264" {
        args.extend(["-preset".into(), settings.preset.clone()]);
    }
    args.extend([
        "-crf".into(),
        settings.crf.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ]);
    if has_audio {
        args.extend([
            "-c:a".into(),
            audio_codec.into(),
            "-b:a".into(),
            settings.audio_bitrate.clone(),
        ]);
    } else {
        args.push("-an".into());
    }
    if target.is_isobmff() {
        args.extend(["-movflags".into(), "+faststart".into()]);
    }
    args.push(lossy(output));
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(args: &[String], flag: &str) -> Option<String> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1).cloned())
    }

    #[test]
    fn test_fast_path_args_copy_streams() {
        let subs = vec![
            SubtitleInput {
                path: PathBuf::from("/s/job.en.srt"),
                language: "en".into(),
            },
            SubtitleInput {
                path: PathBuf::from("/s/job.it.srt"),
                language: "it".into(),
            },
        ];
        let args = fast_path_args(
            Path::new("/v/in.mp4"),
            &subs,
            SubtitleCodec::MovText,
            true,
            &Container::Mp4,
            Path::new("/o/.out.part.mp4"),
        );

        assert_eq!(window(&args, "-c:v").as_deref(), Some("copy"));
        assert_eq!(window(&args, "-c:a").as_deref(), Some("copy"));
        assert_eq!(window(&args, "-c:s").as_deref(), Some("mov_text"));
        assert_eq!(window(&args, "-metadata:s:s:1").as_deref(), Some("language=it"));
        assert_eq!(window(&args, "-movflags").as_deref(), Some("+faststart"));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 3);
        assert!(args.contains(&"2:0".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/o/.out.part.mp4"));
    }

    #[test]
    fn test_fast_path_args_without_audio() {
        let subs = vec![SubtitleInput {
            path: PathBuf::from("/s/job.it.ass"),
            language: "it".into(),
        }];
        let args = fast_path_args(
            Path::new("/v/in.mkv"),
            &subs,
            SubtitleCodec::Ass,
            false,
            &Container::Mkv,
            Path::new("/o/out.mkv"),
        );
        assert!(!args.contains(&"0:a:0".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
        assert!(!args.contains(&"-movflags".to_string()));
        assert_eq!(window(&args, "-c:s").as_deref(), Some("ass"));
    }

    #[test]
    fn test_reencode_args_burn_document() {
        let settings = EncoderSettings::default();
        let args = reencode_args(
            Path::new("/v/in.mov"),
            Path::new("/s/job.dual.ass"),
            &settings,
            true,
            &Container::Mp4,
            Path::new("/o/out.mp4"),
        );
        assert_eq!(window(&args, "-vf").as_deref(), Some("subtitles=/s/job.dual.ass"));
        assert_eq!(window(&args, "-c:v").as_deref(), Some("libx264"));
        assert_eq!(window(&args, "-preset").as_deref(), Some("medium"));
        assert_eq!(window(&args, "-crf").as_deref(), Some("20"));
        assert_eq!(window(&args, "-pix_fmt").as_deref(), Some("yuv420p"));
        assert_eq!(window(&args, "-c:a").as_deref(), Some("aac"));
        assert_eq!(window(&args, "-movflags").as_deref(), Some("+faststart"));
    }

    #[test]
    fn test_reencode_args_silent_webm() {
        let settings = EncoderSettings::default();
        let args = reencode_args(
            Path::new("/v/in.webm"),
            Path::new("/s/job.dual.ass"),
            &settings,
            false,
            &Container::Webm,
            Path::new("/o/out.webm"),
        );
        assert!(args.contains(&"-an".to_string()));
        assert_eq!(window(&args, "-c:v").as_deref(), Some("libvpx-vp9"));
        assert!(!args.contains(&"-preset".to_string()));
        assert!(!args.contains(&"-movflags".to_string()));
    }
}
