// SRT - SubRip rendering and parsing

use crate::domain::errors::RenderError;
use crate::domain::model::{Caption, TrackLane, TranscriptSegment};
use crate::utils::time::{format_srt_timestamp, parse_srt_timestamp};

/// Render captions as SubRip text, one numbered cue per caption
pub fn render_srt(captions: &[Caption], lane: TrackLane) -> String {
    let mut out = String::new();
    for (i, caption) in captions.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(caption.start_seconds),
            format_srt_timestamp(caption.end_seconds),
            caption.text_for(lane).replace("\r\n", "\n")
        ));
    }
    out
}

/// Parse SubRip text into transcript segments.
///
/// Cue numbers are optional and ignored. Multi-line cue text is kept with `\n`
/// separators. A cue without a valid timing line is rejected.
pub fn parse_srt(content: &str) -> Result<Vec<TranscriptSegment>, RenderError> {
    let normalized = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut segments = Vec::new();
    let mut line_no = 0usize;

    for block in normalized.split("\n\n") {
        let lines: Vec<&str> = block.lines().collect();
        let block_start = line_no + 1;
        line_no += lines.len() + 1;
        // Runs of blank lines show up as empty blocks
        let lines: Vec<&str> = lines.into_iter().skip_while(|l| l.trim().is_empty()).collect();
        if lines.is_empty() {
            continue;
        }

        let timing_idx = lines
            .iter()
            .position(|l| l.contains("-->"))
            .ok_or_else(|| RenderError::Parse {
                line: block_start,
                reason: "cue has no timing line".to_string(),
            })?;
        let (start, end) = parse_timing(lines[timing_idx]).ok_or_else(|| RenderError::Parse {
            line: block_start + timing_idx,
            reason: format!("bad timing line '{}'", lines[timing_idx]),
        })?;

        let text = lines[timing_idx + 1..]
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join("\n");
        segments.push(TranscriptSegment::new(start, end, text.trim()));
    }

    Ok(segments)
}

fn parse_timing(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    // Position hints may follow the end timestamp
    let end = rest.split_whitespace().next()?;
    Some((parse_srt_timestamp(start.trim())?, parse_srt_timestamp(end)?))
}
