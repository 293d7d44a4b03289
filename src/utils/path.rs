//! Path helpers for outputs, temporaries and encoder filter arguments

use std::path::{Path, PathBuf};

/// Video file extensions picked up when a directory is given as input
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "mkv", "webm"];

/// Check whether a path looks like a video file we can process
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Default output path: `<out_dir>/<stem>.<src>[-<tgt>].subbed.<ext>`
pub fn default_output_path(
    input: &Path,
    out_dir: Option<&Path>,
    source_language: &str,
    target_language: Option<&str>,
) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp4".to_string());
    let languages = match target_language {
        Some(target) => format!("{}-{}", source_language, target),
        None => source_language.to_string(),
    };
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join(format!("{}.{}.subbed.{}", stem, languages, ext))
}

/// Hidden temporary path next to the final output so the final rename stays on one filesystem
pub fn partial_output_path(output: &Path, tag: &str) -> PathBuf {
    let name = output
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output.mp4".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp4".to_string());
    let parent = output.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!(".{}.{}.part.{}", name, tag, ext))
}

/// Escape a path for use as a value inside an ffmpeg filtergraph (e.g. `subtitles=`)
pub fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut escaped = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '\\' | ':' | '\'' | ',' | '[' | ']' | ';' | '=' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
