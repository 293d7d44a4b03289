//! Subtitle rendering
//!
//! Turns timed captions into styled ASS documents. In dual mode the first
//! track sits on the base margin and the second is stacked above it, far
//! enough that the two never overlap even when the lower track wraps.

pub mod ass;
pub mod srt;

pub use ass::{restyle, DialogueEvent, ScriptInfo, StyleRecord, SubtitleDocument};
pub use srt::{parse_srt, render_srt};

use tracing::debug;

use crate::config::LayoutConfig;
use crate::domain::model::{MediaProfile, SubtitleStyle, SubtitleTrack};
use crate::utils::time::to_centiseconds;

/// Bottom-center in numpad layout
const ALIGNMENT_BOTTOM_CENTER: u8 = 2;

/// Builds ASS documents sized to the probed frame
#[derive(Debug, Clone, Default)]
pub struct SubtitleRenderer {
    layout: LayoutConfig,
}

impl SubtitleRenderer {
    /// Create new renderer with the given layout parameters
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Render a single track
    pub fn render(&self, track: &SubtitleTrack, profile: &MediaProfile) -> SubtitleDocument {
        let mut document = self.empty_document(track.language(), profile);
        document
            .styles
            .push(self.style_record(&track.style, track.style.vertical_margin_px));
        append_events(&mut document, track);
        document
    }

    /// Render two tracks into one document, `lower` on the base margin and `upper` stacked above it
    pub fn render_dual(
        &self,
        lower: &SubtitleTrack,
        upper: &SubtitleTrack,
        profile: &MediaProfile,
    ) -> SubtitleDocument {
        let (lower_margin, upper_margin) = self.dual_margins(lower, upper);
        debug!(
            "Dual layout: {} at MarginV {}, {} at MarginV {}",
            lower.language(),
            lower_margin,
            upper.language(),
            upper_margin
        );

        let title = format!("{} + {}", lower.language(), upper.language());
        let mut document = self.empty_document(&title, profile);
        document.styles.push(self.style_record(&lower.style, lower_margin));
        document.styles.push(self.style_record(&upper.style, upper_margin));
        append_events(&mut document, lower);
        append_events(&mut document, upper);
        document
    }

    /// Vertical margins for a stacked pair.
    ///
    /// The offset is the line height of the larger font times the number of
    /// lines the lower track can occupy, rounded up to whole pixels.
    pub fn dual_margins(&self, lower: &SubtitleTrack, upper: &SubtitleTrack) -> (u32, u32) {
        let base = lower.style.vertical_margin_px;
        let font = lower.style.font_size_pt.max(upper.style.font_size_pt) as f64;
        let offset = font * self.layout.line_spacing_factor * lower.max_lines() as f64;
        (base, base + offset.ceil() as u32)
    }

    fn empty_document(&self, title: &str, profile: &MediaProfile) -> SubtitleDocument {
        SubtitleDocument {
            script_info: ScriptInfo::new(title, profile.width, profile.height),
            styles: Vec::new(),
            events: Vec::new(),
        }
    }

    fn style_record(&self, style: &SubtitleStyle, margin_v: u32) -> StyleRecord {
        StyleRecord {
            name: style.track_language_tag.clone(),
            font_name: style.font_name.clone(),
            font_size: style.font_size_pt,
            primary_colour: style.color.to_ass(),
            secondary_colour: style.color.to_ass(),
            outline_colour: "&H00000000".to_string(),
            back_colour: "&H80000000".to_string(),
            bold: false,
            italic: false,
            border_style: 1,
            outline: 2,
            shadow: 0,
            alignment: ALIGNMENT_BOTTOM_CENTER,
            margin_l: self.layout.margin_h_px,
            margin_r: self.layout.margin_h_px,
            margin_v,
            encoding: 1,
        }
    }
}

fn append_events(document: &mut SubtitleDocument, track: &SubtitleTrack) {
    for caption in &track.captions {
        document.events.push(DialogueEvent {
            layer: 0,
            start_cs: to_centiseconds(caption.start_seconds),
            end_cs: to_centiseconds(caption.end_seconds),
            style: track.language().to_string(),
            text: escape_text(caption.text_for(track.lane)),
        });
    }
}

/// Invisible and non-breaking; splits `\N`, `\n` and `\h` so they render literally
const WORD_JOINER: char = '\u{2060}';

/// Neutralize override blocks and escape sequences, and turn newlines into ASS hard breaks
pub fn escape_text(text: &str) -> String {
    text.trim()
        .replace("\r\n", "\n")
        .replace('\\', &format!("\\{}", WORD_JOINER))
        .replace('{', "(")
        .replace('}', ")")
        .replace('\n', "\\N")
}
