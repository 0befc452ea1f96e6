//! CLI module for vtrim
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::Settings;

pub mod args;
pub mod commands;
pub mod session;

pub use args::{ExportArgs, HistoryArgs, PlanArgs, ProbeArgs};
pub use session::Session;

/// vtrim batch video trimmer
///
/// Trims whole batches of videos without re-encoding. Cut points are moved
/// back to the nearest keyframe and every output records what was asked for
/// and what was cut in its metadata.
#[derive(Parser, Debug)]
#[command(name = "vtrim")]
#[command(about = "Lossless batch video trimming on keyframe boundaries")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: vtrim.toml or config/vtrim.toml)
    #[arg(long, global = true, env = "VTRIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// ffprobe executable
    #[arg(long, global = true)]
    pub ffprobe: Option<PathBuf>,

    /// ffmpeg executable
    #[arg(long, global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply command-line overrides, the last layer of configuration
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
        if self.log_json {
            settings.logging.json = true;
        }
        if let Some(ffprobe) = &self.ffprobe {
            settings.tools.ffprobe = ffprobe.clone();
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            settings.tools.ffmpeg = ffmpeg.clone();
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show frame rate, duration and keyframes of a video
    Probe(ProbeArgs),
    /// Show the keyframe-aligned cuts a session would make
    Plan(PlanArgs),
    /// Trim every ready clip of a session
    Export(ExportArgs),
    /// Show the trim history stored in a file
    History(HistoryArgs),
}
