//! ASS (Advanced SubStation Alpha) document model.
//!
//! Documents are kept as structured records and only turned into text at the
//! write boundary, so style edits never touch event lines.

use std::fmt::{self, Write};

use crate::domain::errors::RenderError;
use crate::utils::time::{format_ass_timestamp, parse_ass_timestamp};

const STYLE_FORMAT: &str = "Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str = "Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// `[Script Info]` header
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptInfo {
    pub title: String,
    pub play_res_x: u32,
    pub play_res_y: u32,
    /// Keys we do not model, preserved in order
    pub extra: Vec<(String, String)>,
}

impl ScriptInfo {
    pub fn new(title: impl Into<String>, play_res_x: u32, play_res_y: u32) -> Self {
        Self {
            title: title.into(),
            play_res_x,
            play_res_y,
            extra: vec![
                ("WrapStyle".to_string(), "0".to_string()),
                ("ScaledBorderAndShadow".to_string(), "yes".to_string()),
            ],
        }
    }
}

/// One `Style:` line of the `[V4+ Styles]` section
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRecord {
    pub name: String,
    pub font_name: String,
    pub font_size: u32,
    pub primary_colour: String,
    pub secondary_colour: String,
    pub outline_colour: String,
    pub back_colour: String,
    pub bold: bool,
    pub italic: bool,
    pub border_style: u8,
    pub outline: u32,
    pub shadow: u32,
    /// Numpad layout: 1-3 bottom, 4-6 middle, 7-9 top
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
    pub encoding: u32,
}

impl StyleRecord {
    fn to_line(&self) -> String {
        format!(
            "Style: {name},{font},{size},{primary},{secondary},{outline_c},{back},{bold},{italic},0,0,100,100,0,0,{border},{outline},{shadow},{align},{ml},{mr},{mv},{enc}",
            name = self.name,
            font = self.font_name,
            size = self.font_size,
            primary = self.primary_colour,
            secondary = self.secondary_colour,
            outline_c = self.outline_colour,
            back = self.back_colour,
            bold = ass_bool(self.bold),
            italic = ass_bool(self.italic),
            border = self.border_style,
            outline = self.outline,
            shadow = self.shadow,
            align = self.alignment,
            ml = self.margin_l,
            mr = self.margin_r,
            mv = self.margin_v,
            enc = self.encoding,
        )
    }

    fn from_fields(format: &[String], values: &[&str], line: usize) -> Result<Self, RenderError> {
        let get = |key: &str| -> Result<&str, RenderError> {
            format
                .iter()
                .position(|f| f.eq_ignore_ascii_case(key))
                .and_then(|i| values.get(i))
                .map(|v| v.trim())
                .ok_or_else(|| parse_error(line, format!("style is missing field {}", key)))
        };
        let num = |key: &str| -> Result<u32, RenderError> {
            let raw = get(key)?;
            raw.parse::<f64>()
                .map(|v| v.round() as u32)
                .map_err(|_| {
                    parse_error(line, format!("style field {} is not a number: {}", key, raw))
                })
        };
        let flag = |key: &str| -> Result<bool, RenderError> { Ok(get(key)? != "0") };

        Ok(Self {
            name: get("Name")?.to_string(),
            font_name: get("Fontname")?.to_string(),
            font_size: num("Fontsize")?,
            primary_colour: get("PrimaryColour")?.to_string(),
            secondary_colour: get("SecondaryColour")?.to_string(),
            outline_colour: get("OutlineColour")?.to_string(),
            back_colour: get("BackColour")?.to_string(),
            bold: flag("Bold")?,
            italic: flag("Italic")?,
            border_style: num("BorderStyle")? as u8,
            outline: num("Outline")?,
            shadow: num("Shadow")?,
            alignment: num("Alignment")? as u8,
            margin_l: num("MarginL")?,
            margin_r: num("MarginR")?,
            margin_v: num("MarginV")?,
            encoding: num("Encoding")?,
        })
    }
}

fn ass_bool(value: bool) -> i32 {
    if value {
        -1
    } else {
        0
    }
}

/// One `Dialogue:` line of the `[Events]` section
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueEvent {
    pub layer: u32,
    pub start_cs: u64,
    pub end_cs: u64,
    pub style: String,
    /// Literal text with `\N` line breaks
    pub text: String,
}

impl DialogueEvent {
    fn to_line(&self) -> String {
        format!(
            "Dialogue: {},{},{},{},,0,0,0,,{}",
            self.layer,
            format_ass_timestamp(self.start_cs),
            format_ass_timestamp(self.end_cs),
            self.style,
            self.text
        )
    }
}

/// A complete styled subtitle document
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleDocument {
    pub script_info: ScriptInfo,
    pub styles: Vec<StyleRecord>,
    pub events: Vec<DialogueEvent>,
}

impl SubtitleDocument {
    pub fn style(&self, name: &str) -> Option<&StyleRecord> {
        self.styles.iter().find(|s| s.name == name)
    }

    /// Rewrite the named style's vertical margin and font size in place.
    /// Events are never touched; applying the same edit twice is a no-op.
    pub fn restyle(
        &mut self,
        track_language_tag: &str,
        new_margin_v: u32,
        new_font_size_pt: u32,
    ) -> Result<(), RenderError> {
        let style = self
            .styles
            .iter_mut()
            .find(|s| s.name == track_language_tag)
            .ok_or_else(|| RenderError::UnknownTrack(track_language_tag.to_string()))?;
        style.margin_v = new_margin_v;
        style.font_size = new_font_size_pt;
        Ok(())
    }

    /// Parse a document previously written by [`SubtitleDocument::to_ass_string`]
    /// or a compatible tool
    pub fn parse(content: &str) -> Result<Self, RenderError> {
        let mut section = String::new();
        let mut title = String::new();
        let mut play_res = (None, None);
        let mut extra = Vec::new();
        let mut style_format = split_format(STYLE_FORMAT);
        let mut event_format = split_format(EVENT_FORMAT);
        let mut styles = Vec::new();
        let mut events = Vec::new();

        for (idx, raw_line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim_start_matches('\u{feff}').trim_end();
            if line.trim().is_empty() || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                section = line[1..line.len() - 1].to_ascii_lowercase();
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                return Err(parse_error(line_no, format!("expected 'Key: value', got '{}'", line)));
            };
            let key = key.trim();
            let value = value.trim_start();

            match section.as_str() {
                "script info" => match key {
                    "Title" => title = value.to_string(),
                    "PlayResX" => play_res.0 = Some(parse_u32(value, line_no)?),
                    "PlayResY" => play_res.1 = Some(parse_u32(value, line_no)?),
                    "ScriptType" => {}
                    _ => extra.push((key.to_string(), value.to_string())),
                },
                "v4+ styles" => match key {
                    "Format" => style_format = split_format(value),
                    "Style" => {
                        let values: Vec<&str> = value.split(',').collect();
                        styles.push(StyleRecord::from_fields(&style_format, &values, line_no)?);
                    }
                    _ => {}
                },
                "events" => match key {
                    "Format" => event_format = split_format(value),
                    "Dialogue" => events.push(parse_dialogue(&event_format, value, line_no)?),
                    _ => {}
                },
                _ => {}
            }
        }

        let (Some(play_res_x), Some(play_res_y)) = play_res else {
            return Err(parse_error(0, "missing PlayResX/PlayResY".to_string()));
        };
        Ok(Self {
            script_info: ScriptInfo {
                title,
                play_res_x,
                play_res_y,
                extra,
            },
            styles,
            events,
        })
    }

    /// Serialize the document to ASS text
    pub fn to_ass_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        writeln!(out, "[Script Info]")?;
        writeln!(out, "; Generated by bisub")?;
        writeln!(out, "Title: {}", self.script_info.title)?;
        writeln!(out, "ScriptType: v4.00+")?;
        writeln!(out, "PlayResX: {}", self.script_info.play_res_x)?;
        writeln!(out, "PlayResY: {}", self.script_info.play_res_y)?;
        for (key, value) in &self.script_info.extra {
            writeln!(out, "{}: {}", key, value)?;
        }
        writeln!(out)?;

        writeln!(out, "[V4+ Styles]")?;
        writeln!(out, "Format: {}", STYLE_FORMAT)?;
        for style in &self.styles {
            writeln!(out, "{}", style.to_line())?;
        }
        writeln!(out)?;

        writeln!(out, "[Events]")?;
        writeln!(out, "Format: {}", EVENT_FORMAT)?;
        for event in &self.events {
            writeln!(out, "{}", event.to_line())?;
        }
        f.write_str(&out)
    }
}

/// Pure form of [`SubtitleDocument::restyle`]
pub fn restyle(
    document: &SubtitleDocument,
    track_language_tag: &str,
    new_margin_v: u32,
    new_font_size_pt: u32,
) -> Result<SubtitleDocument, RenderError> {
    let mut edited = document.clone();
    edited.restyle(track_language_tag, new_margin_v, new_font_size_pt)?;
    Ok(edited)
}

fn split_format(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

fn parse_dialogue(
    format: &[String],
    value: &str,
    line: usize,
) -> Result<DialogueEvent, RenderError> {
    // Text is last and may itself contain commas
    let values: Vec<&str> = value.splitn(format.len().max(1), ',').collect();
    let field = |key: &str| -> Result<&str, RenderError> {
        format
            .iter()
            .position(|f| f.eq_ignore_ascii_case(key))
            .and_then(|i| values.get(i).copied())
            .ok_or_else(|| parse_error(line, format!("dialogue is missing field {}", key)))
    };
    let timestamp = |key: &str| -> Result<u64, RenderError> {
        let raw = field(key)?;
        parse_ass_timestamp(raw)
            .ok_or_else(|| parse_error(line, format!("bad timestamp '{}'", raw)))
    };

    Ok(DialogueEvent {
        layer: field("Layer")?.trim().parse().unwrap_or(0),
        start_cs: timestamp("Start")?,
        end_cs: timestamp("End")?,
        style: field("Style")?.trim().to_string(),
        text: field("Text")?.to_string(),
    })
}

fn parse_u32(value: &str, line: usize) -> Result<u32, RenderError> {
    value
        .trim()
        .parse()
        .map_err(|_| parse_error(line, format!("expected a number, got '{}'", value)))
}

fn parse_error(line: usize, reason: String) -> RenderError {
    RenderError::Parse { line, reason }
}
