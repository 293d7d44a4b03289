//! Subtitle timestamp parsing and formatting utilities

/// Round seconds to whole centiseconds, clamping negatives to zero
pub fn to_centiseconds(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 100.0).round() as u64
}

/// Format centiseconds as an ASS timestamp `H:MM:SS.cc`
pub fn format_ass_timestamp(centiseconds: u64) -> String {
    let cs = centiseconds % 100;
    let total_secs = centiseconds / 100;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{}:{:02}:{:02}.{:02}", h, m, s, cs)
}

/// Parse an ASS timestamp `H:MM:SS.cc` into centiseconds
pub fn parse_ass_timestamp(value: &str) -> Option<u64> {
    let (hms, frac) = value.trim().split_once('.')?;
    let mut parts = hms.split(':');
    let h: u64 = parts.next()?.parse().ok()?;
    let m: u64 = parts.next()?.parse().ok()?;
    let s: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || m >= 60 || s >= 60 || frac.len() != 2 {
        return None;
    }
    let cs: u64 = frac.parse().ok()?;
    Some(((h * 3600 + m * 60 + s) * 100) + cs)
}

/// Format seconds as an SRT timestamp `HH:MM:SS,mmm`
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Parse an SRT timestamp `HH:MM:SS,mmm` (a `.` separator is also accepted)
pub fn parse_srt_timestamp(value: &str) -> Option<f64> {
    let value = value.trim();
    let (hms, millis) = value.split_once(',').or_else(|| value.split_once('.'))?;
    let mut parts = hms.split(':');
    let h: u64 = parts.next()?.trim().parse().ok()?;
    let m: u64 = parts.next()?.parse().ok()?;
    let s: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || m >= 60 || s >= 60 || millis.is_empty() || millis.len() > 3 {
        return None;
    }
    let ms: u64 = format!("{:0<3}", millis).parse().ok()?;
    let total_ms = (h * 3600 + m * 60 + s) * 1000 + ms;
    Some(total_ms as f64 / 1000.0)
}
