// Ports - Interface definitions (contracts)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::DomainError;
use crate::domain::model::MediaInfo;

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Frame rate, duration and keyframes of the first video stream
    ///
    /// Never fails: each part degrades to its default on error.
    async fn probe(&self, path: &Path) -> MediaInfo;

    /// Container level metadata tags
    async fn read_format_tags(&self, path: &Path) -> Result<HashMap<String, String>, DomainError>;
}

/// One lossless cut
#[derive(Debug, Clone, PartialEq)]
pub struct CutJob {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Seek position applied before reading the input
    pub start: f64,
    /// Output length in seconds
    pub duration: f64,
    /// Metadata tags to write, in order
    pub tags: Vec<(String, String)>,
}

/// Port for executing stream-copy cuts
#[async_trait]
pub trait CutPort: Send + Sync {
    /// Copy `[start, start + duration)` of the source without re-encoding,
    /// overwriting the destination
    async fn cut(&self, job: &CutJob) -> Result<(), DomainError>;
}
