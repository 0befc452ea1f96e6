//! FFprobe adapter for media file probing
//!
//! Runs the `ffprobe` executable three times per file (frame rate, duration,
//! packet flags). The three probes are independent: one failing only resets
//! its own field to the default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tracing::debug;

use crate::adapters::tool_command;
use crate::domain::errors::DomainError;
use crate::domain::model::{MediaInfo, DEFAULT_FPS};
use crate::ports::ProbePort;

/// FFprobe-based probe adapter
pub struct FfprobeAdapter {
    program: PathBuf,
}

impl FfprobeAdapter {
    /// Create new FFprobe adapter for the given executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run ffprobe with `args` followed by the input path, returning stdout
    async fn run(&self, args: &[&str], path: &Path) -> Result<String, DomainError> {
        let output = tool_command(&self.program)
            .args(["-v", "error"])
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DomainError::ProbeFailure {
                path: path.display().to_string(),
                reason: format!("failed to run {}: {}", self.program.display(), e),
            })?;

        if !output.status.success() {
            return Err(DomainError::ProbeFailure {
                path: path.display().to_string(),
                reason: format!(
                    "ffprobe exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn probe_fps(&self, path: &Path) -> f64 {
        let args = [
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=r_frame_rate",
            "-of",
            "csv=p=0",
        ];
        match self.run(&args, path).await {
            Ok(out) => parse_frame_rate(&out),
            Err(e) => {
                debug!("Frame rate probe failed: {}", e);
                DEFAULT_FPS
            }
        }
    }

    async fn probe_duration(&self, path: &Path) -> f64 {
        let args = ["-show_entries", "format=duration", "-of", "csv=p=0"];
        match self.run(&args, path).await {
            Ok(out) => parse_duration(&out),
            Err(e) => {
                debug!("Duration probe failed: {}", e);
                0.0
            }
        }
    }

    async fn probe_keyframes(&self, path: &Path) -> Vec<f64> {
        let args = [
            "-select_streams",
            "v:0",
            "-show_entries",
            "packet=pts_time,flags",
            "-of",
            "csv=p=0",
        ];
        match self.run(&args, path).await {
            Ok(out) => parse_keyframes(&out),
            Err(e) => {
                debug!("Keyframe probe failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe(&self, path: &Path) -> MediaInfo {
        let (fps, duration, keyframes) = tokio::join!(
            self.probe_fps(path),
            self.probe_duration(path),
            self.probe_keyframes(path)
        );

        debug!(
            "Probed {}: {:.3} fps, {:.3}s, {} keyframes",
            path.display(),
            fps,
            duration,
            keyframes.len()
        );

        MediaInfo {
            fps,
            duration,
            keyframes,
        }
    }

    async fn read_format_tags(&self, path: &Path) -> Result<HashMap<String, String>, DomainError> {
        let out = self
            .run(&["-print_format", "json", "-show_format"], path)
            .await
            .map_err(|e| DomainError::MetadataReadFailure(e.to_string()))?;
        parse_format_tags(&out)
    }
}

fn first_line(raw: &str) -> &str {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

/// Parse a `num/den` or decimal frame rate, falling back to 25 fps
pub fn parse_frame_rate(raw: &str) -> f64 {
    let raw = first_line(raw).trim_end_matches(',');
    let fps = match raw.split_once('/') {
        Some((num, den)) => match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
            (Ok(num), Ok(den)) if den != 0.0 => num / den,
            _ => DEFAULT_FPS,
        },
        None => raw.parse::<f64>().unwrap_or(DEFAULT_FPS),
    };

    if fps > 0.0 && fps.is_finite() {
        fps
    } else {
        DEFAULT_FPS
    }
}

/// Parse a decimal duration, `0.0` when unusable
pub fn parse_duration(raw: &str) -> f64 {
    match first_line(raw).trim_end_matches(',').parse::<f64>() {
        Ok(duration) if duration.is_finite() && duration > 0.0 => duration,
        _ => 0.0,
    }
}

/// Collect keyframe timestamps from `pts_time,flags` lines
///
/// The result is sorted and free of duplicates.
pub fn parse_keyframes(raw: &str) -> Vec<f64> {
    let mut keyframes: Vec<f64> = raw
        .lines()
        .filter_map(|line| {
            let mut fields = line.trim().split(',');
            let pts = fields.next()?.trim();
            let flags = fields.next()?;
            if !flags.contains('K') {
                return None;
            }
            pts.parse::<f64>().ok().filter(|t| t.is_finite())
        })
        .collect();

    keyframes.sort_by(f64::total_cmp);
    keyframes.dedup();
    keyframes
}

/// Extract `format.tags` from `-show_format` JSON output
pub fn parse_format_tags(raw: &str) -> Result<HashMap<String, String>, DomainError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| DomainError::MetadataReadFailure(e.to_string()))?;

    let tags = value
        .get("format")
        .and_then(|format| format.get("tags"))
        .and_then(|tags| tags.as_object())
        .map(|tags| {
            tags.iter()
                .map(|(key, value)| {
                    let text = match value.as_str() {
                        Some(text) => text.to_string(),
                        None => value.to_string(),
                    };
                    (key.clone(), text)
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(tags)
}
