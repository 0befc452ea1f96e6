//! Cut point planning
//!
//! Stream copy can only start a segment on a keyframe, so both markers are
//! moved back to the nearest preceding keyframe before cutting. One frame of
//! tolerance lets a marker placed just before a keyframe land on it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::Clip;

pub mod keyframes;

pub use keyframes::{snap, KeyframeIndex};

/// Snap tolerance used when a clip has no usable frame rate
pub const FALLBACK_TOLERANCE: f64 = 0.05;

/// Keyframe-aligned cut points for one clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimPlan {
    /// Start marker before snapping
    pub requested_start: f64,
    /// End marker before snapping
    pub requested_end: f64,
    /// Keyframe the output starts on
    pub actual_start: f64,
    /// Keyframe the output stops at
    pub actual_end: f64,
    /// Length of the output in seconds
    pub new_duration: f64,
}

/// Planner turning markers into keyframe-aligned cut points
pub struct TrimPlanner;

impl TrimPlanner {
    /// Snap tolerance for a frame rate: one frame
    pub fn tolerance(fps: f64) -> f64 {
        if fps > 0.0 && fps.is_finite() {
            1.0 / fps
        } else {
            FALLBACK_TOLERANCE
        }
    }

    /// Plan the cut for a clip
    ///
    /// Fails with `InvalidRange` when the snapped start is not strictly
    /// before the snapped end.
    pub fn plan(clip: &Clip) -> Result<TrimPlan, DomainError> {
        let tolerance = Self::tolerance(clip.fps);
        let index = KeyframeIndex::new(&clip.keyframes);

        let actual_start = index.snap(clip.start_marker, tolerance);
        let actual_end = index.snap(clip.end_marker, tolerance);

        debug!(
            "{}: start {:.3}s -> {:.3}s, end {:.3}s -> {:.3}s (tolerance {:.4}s)",
            clip.filename, clip.start_marker, actual_start, clip.end_marker, actual_end, tolerance
        );

        if actual_start >= actual_end {
            return Err(DomainError::InvalidRange {
                start: actual_start,
                end: actual_end,
            });
        }

        Ok(TrimPlan {
            requested_start: clip.start_marker,
            requested_end: clip.end_marker,
            actual_start,
            actual_end,
            new_duration: actual_end - actual_start,
        })
    }
}
