// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Frame rate assumed when a source reports none or garbage
pub const DEFAULT_FPS: f64 = 25.0;

/// Stable identifier of a clip inside a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

/// Stable identifier of a group inside a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Target of a marker edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Clip(ClipId),
    Group(GroupId),
}

/// Which end of a clip a marker bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Start,
    End,
}

impl MarkerKind {
    /// Parse marker kind from string
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_lowercase().as_str() {
            "start" | "in" => Some(MarkerKind::Start),
            "end" | "out" => Some(MarkerKind::End),
            _ => None,
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKind::Start => write!(f, "start"),
            MarkerKind::End => write!(f, "end"),
        }
    }
}

/// Result of probing a source file
///
/// Probing never fails outright: each field falls back to its safe default
/// (`DEFAULT_FPS`, `0.0`, empty) and the caller decides whether the file can
/// be planned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub fps: f64,
    pub duration: f64,
    pub keyframes: Vec<f64>,
}

impl Default for MediaInfo {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            duration: 0.0,
            keyframes: Vec::new(),
        }
    }
}

impl MediaInfo {
    /// Check the probe result against the planning preconditions
    pub fn ensure_plannable(&self, path: &Path) -> Result<(), DomainError> {
        if self.duration <= 0.0 || !self.duration.is_finite() {
            return Err(DomainError::ProbeFailure {
                path: path.display().to_string(),
                reason: "duration unavailable".to_string(),
            });
        }
        if self.keyframes.is_empty() {
            return Err(DomainError::ProbeFailure {
                path: path.display().to_string(),
                reason: "no keyframes found".to_string(),
            });
        }
        Ok(())
    }
}

/// A single source video and its trim markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub path: PathBuf,
    pub filename: String,
    pub fps: f64,
    pub duration: f64,
    pub keyframes: Vec<f64>,
    pub start_marker: f64,
    pub end_marker: f64,
    pub ready: bool,
}

impl Clip {
    /// Create a clip spanning the whole probed source
    pub fn new(id: ClipId, path: impl Into<PathBuf>, media: MediaInfo) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let fps = if media.fps > 0.0 && media.fps.is_finite() {
            media.fps
        } else {
            DEFAULT_FPS
        };

        Self {
            id,
            path,
            filename,
            fps,
            duration: media.duration,
            keyframes: media.keyframes,
            start_marker: 0.0,
            end_marker: media.duration,
            ready: false,
        }
    }

    /// Replace duration and keyframes with a fresh probe, keeping markers
    pub fn refreshed(&self, media: &MediaInfo) -> Self {
        Self {
            duration: media.duration,
            keyframes: media.keyframes.clone(),
            ..self.clone()
        }
    }
}

/// Organizational aggregate of clips sharing one edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub clips: Vec<Clip>,
    pub start_marker: f64,
    pub end_marker: f64,
    pub ready: bool,
}

impl Group {
    /// Create an empty group
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            clips: Vec::new(),
            start_marker: 0.0,
            end_marker: 0.0,
            ready: false,
        }
    }

    /// Position of a clip among the children
    pub fn position(&self, clip: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id == clip)
    }
}

/// Entry at the catalog root
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Clip(Clip),
    Group(Group),
}

impl Node {
    /// Identifier of this node
    pub fn id(&self) -> NodeId {
        match self {
            Node::Clip(clip) => NodeId::Clip(clip.id),
            Node::Group(group) => NodeId::Group(group.id),
        }
    }
}
