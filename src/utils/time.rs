//! Time parsing and formatting utilities

use crate::error::{TrimError, TrimResult};
use crate::domain::model::DEFAULT_FPS;

/// Parse a time string to seconds
///
/// Accepts plain seconds (`12.5`), `MM:SS(.ms)` and `HH:MM:SS(.ms)`.
pub fn parse_time(time_str: &str) -> TrimResult<f64> {
    let time_str = time_str.trim();
    let invalid = || TrimError::InvalidTimeFormat {
        time: time_str.to_string(),
    };

    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() > 3 || parts.iter().any(|part| part.trim().is_empty()) {
        return Err(invalid());
    }

    let values = parts
        .iter()
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|_| invalid())?;

    if values.iter().any(|value| !value.is_finite() || *value < 0.0) {
        return Err(invalid());
    }

    let seconds = match values.as_slice() {
        [seconds] => *seconds,
        [minutes, seconds] if *seconds < 60.0 => minutes * 60.0 + seconds,
        [hours, minutes, seconds] if *minutes < 60.0 && *seconds < 60.0 => {
            hours * 3600.0 + minutes * 60.0 + seconds
        }
        _ => return Err(invalid()),
    };

    Ok(seconds)
}

/// Format seconds as `HH:MM:SS.mmm`, or `MM:SS.mmm` under an hour
pub fn format_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let milliseconds = total_ms % 1000;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, milliseconds)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, secs, milliseconds)
    }
}

/// Format seconds as an `HH:MM:SS:FF` timecode at `fps`
pub fn format_timecode(seconds: f64, fps: f64) -> String {
    let fps = if fps > 0.0 && fps.is_finite() { fps } else { DEFAULT_FPS };
    let seconds = seconds.max(0.0);
    let whole = seconds.floor() as u64;
    let frame_limit = fps.ceil().max(1.0) as u64 - 1;
    let frames = (((seconds - whole as f64) * fps + 1e-6) as u64).min(frame_limit);

    format!(
        "{:02}:{:02}:{:02}:{:02}",
        whole / 3600,
        (whole % 3600) / 60,
        whole % 60,
        frames
    )
}
