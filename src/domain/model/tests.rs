// Unit tests for domain models

use super::*;
use std::path::Path;

fn profile() -> MediaProfile {
    MediaProfile {
        video_codec: "h264".to_string(),
        audio_codec: Some("aac".to_string()),
        width: 1920,
        height: 1080,
        duration_seconds: 60.0,
        container: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
    }
}

fn style(tag: &str) -> SubtitleStyle {
    SubtitleStyle {
        track_language_tag: tag.to_string(),
        font_name: "Inter".to_string(),
        font_size_pt: 48,
        vertical_margin_px: 54,
        color: Rgba::WHITE,
    }
}

#[test]
fn test_rgba_parse_and_ass_literal() {
    let colour = Rgba::parse_hex("#FFE65C").unwrap();
    assert_eq!(colour, Rgba::YELLOW);
    assert_eq!(colour.to_ass(), "&H005CE6FF");

    let translucent = Rgba::parse_hex("#00000080").unwrap();
    assert_eq!(translucent.a, 0x80);
    assert_eq!(translucent.to_ass(), "&H7F000000");
}

#[test]
fn test_rgba_parse_invalid() {
    assert!(Rgba::parse_hex("#FFF").is_err());
    assert!(Rgba::parse_hex("#GGGGGG").is_err());
}

#[test]
fn test_rgba_parse_rejects_non_ascii_without_panicking() {
    // Six bytes, but not six hex digits
    assert!(Rgba::parse_hex("#aéééb").is_err());
    assert!(Rgba::parse_hex("ÿÿÿ").is_err());
}

#[test]
fn test_style_colour_from_toml_rejects_non_ascii() {
    let parsed: Result<crate::config::StyleConfig, _> =
        toml::from_str("font_name = \"Inter\"\nfont_size_pt = 40\ncolor = \"#aéééb\"\n");
    assert!(parsed.is_err());
}

#[test]
fn test_caption_text_for_lane_falls_back_to_source() {
    let mut caption = Caption::new(0.0, 2.0, "ciao");
    assert_eq!(caption.text_for(TrackLane::Translation), "ciao");
    caption.translated_text = Some("hello".to_string());
    assert_eq!(caption.text_for(TrackLane::Translation), "hello");
    assert_eq!(caption.text_for(TrackLane::Source), "ciao");
    assert_eq!(caption.duration(), 2.0);
}

#[test]
fn test_container_from_path() {
    assert_eq!(Container::from_path(Path::new("a/b.MP4")), Container::Mp4);
    assert_eq!(Container::from_path(Path::new("x.mkv")), Container::Mkv);
    assert_eq!(Container::from_path(Path::new("x.webm")), Container::Webm);
    assert_eq!(
        Container::from_path(Path::new("x.avi")),
        Container::Other("avi".to_string())
    );
    assert!(Container::Mov.is_isobmff());
    assert!(!Container::Mkv.is_isobmff());
}

#[test]
fn test_mux_request_rejects_bad_track_counts() {
    let track = SubtitleTrack::new(vec![], style("it"), TrackLane::Source);
    let none = MuxRequest::new("in.mp4".into(), vec![], "out.mp4".into(), profile());
    assert!(matches!(none, Err(MuxError::InvalidRequest(_))));

    let three = MuxRequest::new(
        "in.mp4".into(),
        vec![track.clone(), track.clone(), track.clone()],
        "out.mp4".into(),
        profile(),
    );
    assert!(three.is_err());

    let ok = MuxRequest::new("in.mp4".into(), vec![track], "out.mp4".into(), profile());
    assert!(ok.is_ok());
}

#[test]
fn test_mux_request_rejects_overwriting_input() {
    let track = SubtitleTrack::new(vec![], style("it"), TrackLane::Source);
    let result = MuxRequest::new("same.mp4".into(), vec![track], "same.mp4".into(), profile());
    assert!(result.is_err());
}

#[test]
fn test_track_max_lines() {
    let captions = vec![
        Caption::new(0.0, 1.0, "one line"),
        Caption::new(1.0, 2.0, "first\nsecond"),
    ];
    let track = SubtitleTrack::new(captions, style("it"), TrackLane::Source);
    assert_eq!(track.max_lines(), 2);

    let empty = SubtitleTrack::new(vec![], style("it"), TrackLane::Source);
    assert_eq!(empty.max_lines(), 1);
}

#[test]
fn test_job_ids_are_unique_and_path_safe() {
    let a = JobId::generate(Path::new("/videos/lavatrice istruzioni.mp4"));
    let b = JobId::generate(Path::new("/videos/lavatrice istruzioni.mp4"));
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("lavatrice_istruzioni-"));
    assert!(!a.as_str().contains(' '));
    assert!(!a.as_str().contains('/'));
}
