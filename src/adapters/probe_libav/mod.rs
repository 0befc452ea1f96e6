// Probe LibAV adapter - Media file analysis using libav

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ffmpeg_next as ffmpeg;
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::MediaInfo;
use crate::ports::ProbePort;

/// LibAV-based media probing adapter
///
/// Reads the container in-process instead of spawning ffprobe. Demuxing runs
/// on the blocking thread pool.
pub struct LibavProbeAdapter;

impl LibavProbeAdapter {
    /// Create new LibAV probing adapter
    pub fn new() -> Result<Self, DomainError> {
        ffmpeg::init().map_err(|e| DomainError::ProbeFailure {
            path: String::new(),
            reason: format!("FFmpeg initialization failed: {}", e),
        })?;
        Ok(Self)
    }
}

fn probe_blocking(path: &Path) -> MediaInfo {
    let mut info = MediaInfo::default();

    let mut input = match ffmpeg::format::input(&path) {
        Ok(input) => input,
        Err(e) => {
            debug!("Failed to open {}: {}", path.display(), e);
            return info;
        }
    };

    if input.duration() > 0 {
        info.duration = input.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
    }

    let (stream_index, time_base) = match input.streams().best(ffmpeg::media::Type::Video) {
        Some(stream) => {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                let fps = f64::from(rate);
                if fps > 0.0 && fps.is_finite() {
                    info.fps = fps;
                }
            }
            (stream.index(), f64::from(stream.time_base()))
        }
        None => {
            debug!("No video stream in {}", path.display());
            return info;
        }
    };

    let mut keyframes = Vec::new();
    for (stream, packet) in input.packets() {
        if stream.index() != stream_index || !packet.is_key() {
            continue;
        }
        if let Some(pts) = packet.pts() {
            keyframes.push(pts as f64 * time_base);
        }
    }
    keyframes.sort_by(f64::total_cmp);
    keyframes.dedup();
    info.keyframes = keyframes;

    info
}

fn tags_blocking(path: &Path) -> Result<HashMap<String, String>, DomainError> {
    let input = ffmpeg::format::input(&path)
        .map_err(|e| DomainError::MetadataReadFailure(e.to_string()))?;
    Ok(input
        .metadata()
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect())
}

#[async_trait]
impl ProbePort for LibavProbeAdapter {
    async fn probe(&self, path: &Path) -> MediaInfo {
        let owned: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || probe_blocking(&owned))
            .await
            .unwrap_or_default()
    }

    async fn read_format_tags(&self, path: &Path) -> Result<HashMap<String, String>, DomainError> {
        let owned: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || tags_blocking(&owned))
            .await
            .map_err(|e| DomainError::MetadataReadFailure(e.to_string()))?
    }
}
