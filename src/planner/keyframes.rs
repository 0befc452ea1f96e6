//! Keyframe lookups over a sorted timestamp list

/// Minimum distance for keyframe navigation to count as a move
const NAVIGATION_GAP: f64 = 0.1;

/// Greatest keyframe not later than `target + tolerance`
///
/// Returns `0.0` when the list is empty or every keyframe is past the bound.
/// `keyframes` must be sorted ascending.
pub fn snap(keyframes: &[f64], target: f64, tolerance: f64) -> f64 {
    let limit = target + tolerance;
    let count = keyframes.partition_point(|&k| k <= limit);
    if count == 0 {
        0.0
    } else {
        keyframes[count - 1]
    }
}

/// Borrowed view over a clip's keyframes
#[derive(Debug, Clone, Copy)]
pub struct KeyframeIndex<'a> {
    keyframes: &'a [f64],
}

impl<'a> KeyframeIndex<'a> {
    /// Wrap an ascending keyframe list
    pub fn new(keyframes: &'a [f64]) -> Self {
        Self { keyframes }
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// See [`snap`]
    pub fn snap(&self, target: f64, tolerance: f64) -> f64 {
        snap(self.keyframes, target, tolerance)
    }

    /// First keyframe more than 0.1s after `position`
    pub fn next_after(&self, position: f64) -> Option<f64> {
        let index = self
            .keyframes
            .partition_point(|&k| k <= position + NAVIGATION_GAP);
        self.keyframes.get(index).copied()
    }

    /// Last keyframe more than 0.1s before `position`
    pub fn prev_before(&self, position: f64) -> Option<f64> {
        let index = self
            .keyframes
            .partition_point(|&k| k < position - NAVIGATION_GAP);
        index.checked_sub(1).map(|i| self.keyframes[i])
    }

    /// Average spacing between keyframes, if there are at least two
    pub fn average_gop(&self) -> Option<f64> {
        match (self.keyframes.first(), self.keyframes.last()) {
            (Some(first), Some(last)) if self.keyframes.len() > 1 => {
                Some((last - first) / (self.keyframes.len() - 1) as f64)
            }
            _ => None,
        }
    }
}
