//! FFmpeg execution adapter
//!
//! Performs stream-copy cuts by running the `ffmpeg` executable.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tracing::debug;

use crate::adapters::tool_command;
use crate::domain::errors::DomainError;
use crate::ports::{CutJob, CutPort};

/// FFmpeg-based execution adapter
pub struct FfmpegCutAdapter {
    program: PathBuf,
}

impl FfmpegCutAdapter {
    /// Create new FFmpeg adapter for the given executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Command line for a cut
///
/// `-ss` goes before `-i` so ffmpeg seeks the input instead of decoding up
/// to the start point.
pub fn build_cut_args(job: &CutJob) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-ss".into(),
        format!("{:.6}", job.start).into(),
        "-i".into(),
        job.source.clone().into_os_string(),
        "-t".into(),
        format!("{:.6}", job.duration).into(),
        "-fflags".into(),
        "+genpts".into(),
        "-c".into(),
        "copy".into(),
    ];

    let is_mp4 = job
        .destination
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("mp4"))
        .unwrap_or(false);
    if is_mp4 {
        // mp4 drops unknown keys unless asked to keep them
        args.push("-movflags".into());
        args.push("use_metadata_tags".into());
    }

    for (key, value) in &job.tags {
        args.push("-metadata".into());
        args.push(format!("{}={}", key, value).into());
    }

    args.push("-y".into());
    args.push(job.destination.clone().into_os_string());
    args
}

#[async_trait]
impl CutPort for FfmpegCutAdapter {
    async fn cut(&self, job: &CutJob) -> Result<(), DomainError> {
        let args = build_cut_args(job);
        debug!("Running {} {:?}", self.program.display(), args);

        let output = tool_command(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DomainError::CutFailure {
                path: job.source.display().to_string(),
                reason: format!("failed to run {}: {}", self.program.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no error output");
            return Err(DomainError::CutFailure {
                path: job.source.display().to_string(),
                reason: format!("ffmpeg exited with {}: {}", output.status, detail.trim()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(destination: &str) -> CutJob {
        CutJob {
            source: PathBuf::from("/in/clip.mov"),
            destination: PathBuf::from(destination),
            start: 4.0,
            duration: 86.0,
            tags: vec![
                ("comment".to_string(), "Trimmed".to_string()),
                ("trim_history_1_start_actual".to_string(), "4.000000".to_string()),
            ],
        }
    }

    fn as_strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_cut_args_order() {
        let args = as_strings(build_cut_args(&job("/out/clip.mov")));
        let expected: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-ss",
            "4.000000",
            "-i",
            "/in/clip.mov",
            "-t",
            "86.000000",
            "-fflags",
            "+genpts",
            "-c",
            "copy",
            "-metadata",
            "comment=Trimmed",
            "-metadata",
            "trim_history_1_start_actual=4.000000",
            "-y",
            "/out/clip.mov",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn test_mp4_keeps_custom_tags() {
        let args = as_strings(build_cut_args(&job("/out/clip.MP4")));
        let movflags = args.iter().position(|a| a == "-movflags").unwrap();
        assert_eq!(args[movflags + 1], "use_metadata_tags");
        assert!(movflags < args.iter().position(|a| a == "-metadata").unwrap());
    }

    #[tokio::test]
    async fn test_missing_program_is_cut_failure() {
        let adapter = FfmpegCutAdapter::new("/nonexistent/ffmpeg-for-tests");
        let result = adapter.cut(&job("/tmp/never-written.mov")).await;
        assert!(matches!(result, Err(DomainError::CutFailure { .. })));
    }
}
