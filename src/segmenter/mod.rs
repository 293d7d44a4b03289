//! Caption segmentation
//!
//! Re-chunks raw transcript segments into display-sized captions. Lines are
//! filled greedily word by word, captions get a share of their segment's time
//! proportional to their character count, and captions shorter than the
//! display floor are merged forward into the next caption of the same segment.
//! The captions of one segment always partition its time span exactly.

use tracing::{debug, warn};

use crate::config::SegmentationConfig;
use crate::domain::errors::SegmentError;
use crate::domain::model::{Caption, TranscriptSegment};

/// Captions produced for a transcript plus the segments that had to be skipped
#[derive(Debug, Clone, Default)]
pub struct SegmentationOutcome {
    pub captions: Vec<Caption>,
    pub skipped: Vec<SegmentError>,
}

/// Greedy, character-proportional caption segmenter
#[derive(Debug, Clone)]
pub struct CaptionSegmenter {
    max_chars_per_line: usize,
    min_duration_seconds: f64,
    max_lines_per_caption: usize,
}

impl CaptionSegmenter {
    /// Create a segmenter; zero budgets are raised to one
    pub fn new(
        max_chars_per_line: usize,
        min_duration_seconds: f64,
        max_lines_per_caption: usize,
    ) -> Self {
        Self {
            max_chars_per_line: max_chars_per_line.max(1),
            min_duration_seconds: min_duration_seconds.max(0.0),
            max_lines_per_caption: max_lines_per_caption.max(1),
        }
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self::new(
            config.max_chars_per_line,
            config.min_duration_seconds,
            config.max_lines_per_caption,
        )
    }

    /// Segment a transcript, dropping invalid segments
    pub fn segment(&self, raw: &[TranscriptSegment]) -> Vec<Caption> {
        self.segment_with_report(raw).captions
    }

    /// Segment a transcript and report every skipped segment
    pub fn segment_with_report(&self, raw: &[TranscriptSegment]) -> SegmentationOutcome {
        let mut outcome = SegmentationOutcome::default();
        let mut track_end = f64::NEG_INFINITY;

        for (index, segment) in raw.iter().enumerate() {
            if segment.text.trim().is_empty() {
                debug!("Segment {} is empty, producing no captions", index);
                continue;
            }

            let mut start = segment.start_seconds;
            let end = segment.end_seconds;
            if start < track_end {
                warn!(
                    "Segment {} starts at {:.3}s before the previous segment ends at {:.3}s; clipping its start",
                    index, start, track_end
                );
                start = track_end;
            }

            if !(start.is_finite() && end.is_finite()) || end <= start {
                let err = SegmentError::NonPositiveDuration {
                    index,
                    start: segment.start_seconds,
                    end,
                };
                warn!("Skipping transcript segment: {}", err);
                outcome.skipped.push(err);
                continue;
            }

            let captions = self.split_segment(start, end, &segment.text);
            if let Some(last) = captions.last() {
                track_end = last.end_seconds;
            }
            outcome.captions.extend(captions);
        }

        outcome
    }

    /// Split one valid segment into captions covering exactly `[start, end]`
    fn split_segment(&self, start: f64, end: f64, text: &str) -> Vec<Caption> {
        let lines = self.wrap_lines(text);
        let drafts: Vec<Draft> = lines
            .chunks(self.max_lines_per_caption)
            .map(|chunk| Draft {
                lines: chunk.to_vec(),
                start,
                end,
            })
            .collect();

        let timed = allocate_times(drafts, start, end);
        self.merge_short(timed)
            .into_iter()
            .map(|draft| Caption::new(draft.start, draft.end, draft.lines.join("\n")))
            .collect()
    }

    /// Greedy word-wise line filling. A word longer than the budget gets a line of its own.
    fn wrap_lines(&self, text: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in text.split_whitespace() {
            let word_len = word.chars().count();
            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= self.max_chars_per_line {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    /// Merge non-final captions below the display floor into their successor
    fn merge_short(&self, drafts: Vec<Draft>) -> Vec<Draft> {
        let count = drafts.len();
        let mut merged: Vec<Draft> = Vec::with_capacity(count);
        let mut pending: Option<Draft> = None;

        for (i, draft) in drafts.into_iter().enumerate() {
            let draft = match pending.take() {
                Some(short) => short.absorb(draft),
                None => draft,
            };
            let is_last = i + 1 == count;
            if !is_last && draft.end - draft.start < self.min_duration_seconds {
                debug!(
                    "Caption '{}' lasts {:.3}s, merging forward",
                    draft.lines.join(" "),
                    draft.end - draft.start
                );
                pending = Some(draft);
                continue;
            }
            merged.push(draft);
        }
        merged
    }
}

/// Segment a transcript with explicit budgets
pub fn segment(
    raw: &[TranscriptSegment],
    max_chars_per_line: usize,
    min_duration_seconds: f64,
    max_lines_per_caption: usize,
) -> Vec<Caption> {
    CaptionSegmenter::new(max_chars_per_line, min_duration_seconds, max_lines_per_caption)
        .segment(raw)
}

/// Caption under construction
#[derive(Debug, Clone)]
struct Draft {
    lines: Vec<String>,
    start: f64,
    end: f64,
}

impl Draft {
    fn char_count(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum()
    }

    /// Join `next` onto this caption, keeping this caption's start
    fn absorb(mut self, next: Draft) -> Draft {
        self.lines.extend(next.lines);
        self.end = next.end;
        self
    }
}

/// Give each draft a span proportional to its characters; the last one ends exactly at `end`
fn allocate_times(mut drafts: Vec<Draft>, start: f64, end: f64) -> Vec<Draft> {
    let total_chars: usize = drafts.iter().map(Draft::char_count).sum();
    let duration = end - start;
    let count = drafts.len();
    let mut consumed = 0usize;
    let mut cursor = start;

    for (i, draft) in drafts.iter_mut().enumerate() {
        consumed += draft.char_count();
        draft.start = cursor;
        draft.end = if i + 1 == count || total_chars == 0 {
            end
        } else {
            start + duration * consumed as f64 / total_chars as f64
        };
        cursor = draft.end;
    }
    drafts
}
