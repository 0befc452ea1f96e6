// Domain errors - Error types for the domain layer

use thiserror::Error;

use crate::domain::model::{ClipId, GroupId};

/// Domain-specific error types
///
/// Every per-clip failure of an export is one of the first four variants and
/// is reported on the log channel instead of aborting the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Unusable duration or no keyframes for a source
    #[error("Failed to analyze {path}: {reason}")]
    ProbeFailure { path: String, reason: String },

    /// Snapped start is not before snapped end
    #[error("Invalid trim range: snapped start {start:.3}s is not before snapped end {end:.3}s")]
    InvalidRange { start: f64, end: f64 },

    /// The cut tool failed or exited abnormally
    #[error("Cut failed for {path}: {reason}")]
    CutFailure { path: String, reason: String },

    /// Container tags could not be read
    #[error("Failed to read metadata: {0}")]
    MetadataReadFailure(String),

    /// Marker values must be finite and non-negative
    #[error("Invalid marker value: {0}")]
    InvalidMarker(f64),

    /// Clip id not present in the catalog
    #[error("Unknown clip: {0}")]
    UnknownClip(ClipId),

    /// Group id not present in the catalog
    #[error("Unknown group: {0}")]
    UnknownGroup(GroupId),

    /// Grouping needs at least one clip
    #[error("Selection is empty")]
    EmptySelection,

    /// Only one export may run per pipeline
    #[error("An export is already running")]
    ExportInProgress,

    /// The background worker panicked or was aborted
    #[error("Export worker stopped unexpectedly: {0}")]
    WorkerFailed(String),
}
