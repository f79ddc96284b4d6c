use std::fmt::Write;

use super::assembler::PlacedClip;

/// `HH:MM:SS,mmm`
pub fn format_timestamp(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// SRT subtitles for placed clips, timed at their actual positions
pub fn generate<C>(placed: &[PlacedClip<C>]) -> String {
    let mut out = String::new();
    for (i, clip) in placed.iter().enumerate() {
        let text = clip.text.replace(['\r', '\n'], " ");
        // Writing to a String cannot fail
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(clip.actual_start),
            format_timestamp(clip.end()),
            text
        );
    }
    out
}
