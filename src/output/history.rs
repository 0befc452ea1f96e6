//! Trim provenance chain stored in container tags
//!
//! Each trim appends a numbered set of `trim_history_<n>_*` tags. The next
//! number is the first `n` with no `trim_history_<n>_source_duration` tag, so
//! trimming an already trimmed file keeps every earlier record.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::planner::TrimPlan;
use crate::ports::ProbePort;

/// Comment tag written on every trimmed output
pub const DEFAULT_COMMENT: &str = "Trimmed with vtrim";

const PREFIX: &str = "trim_history_";

/// Requested and actual boundaries of one trim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub index: u32,
    pub source_duration: f64,
    pub start_requested: f64,
    pub start_actual: f64,
    /// Seconds requested off the tail
    pub end_requested: f64,
    /// Seconds actually cut off the tail
    pub end_actual: f64,
}

impl HistoryRecord {
    /// Build the record for a plan against a source of `source_duration`
    pub fn from_plan(index: u32, plan: &TrimPlan, source_duration: f64) -> Self {
        Self {
            index,
            source_duration,
            start_requested: plan.requested_start,
            start_actual: plan.actual_start,
            end_requested: (source_duration - plan.requested_end).max(0.0),
            end_actual: source_duration - plan.actual_end,
        }
    }

    /// Tags for this record, `comment` first
    pub fn to_tags(&self, comment: &str) -> Vec<(String, String)> {
        let n = self.index;
        vec![
            ("comment".to_string(), comment.to_string()),
            (
                format!("{PREFIX}{n}_source_duration"),
                format!("{:.6}", self.source_duration),
            ),
            (
                format!("{PREFIX}{n}_start_requested"),
                format!("{:.3}", self.start_requested),
            ),
            (
                format!("{PREFIX}{n}_start_actual"),
                format!("{:.6}", self.start_actual),
            ),
            (
                format!("{PREFIX}{n}_end_requested"),
                format!("{:.3}", self.end_requested),
            ),
            (
                format!("{PREFIX}{n}_end_actual"),
                format!("{:.6}", self.end_actual),
            ),
        ]
    }
}

/// Builder for the provenance chain
pub struct MetadataHistory;

impl MetadataHistory {
    /// Lowest unused record number, starting at 1
    pub fn next_index(tags: &HashMap<String, String>) -> u32 {
        let mut index = 1;
        while tags.contains_key(&format!("{PREFIX}{index}_source_duration")) {
            index += 1;
        }
        index
    }

    /// Next record for a plan given the source's existing tags
    pub fn next_record(
        tags: &HashMap<String, String>,
        plan: &TrimPlan,
        source_duration: f64,
    ) -> HistoryRecord {
        HistoryRecord::from_plan(Self::next_index(tags), plan, source_duration)
    }

    /// Read the source's tags and build its next record
    ///
    /// Unreadable tags count as an empty history.
    pub async fn next_record_for(
        probe: &dyn ProbePort,
        path: &Path,
        plan: &TrimPlan,
        source_duration: f64,
    ) -> HistoryRecord {
        let tags = match probe.read_format_tags(path).await {
            Ok(tags) => tags,
            Err(e) => {
                debug!("No prior history for {}: {}", path.display(), e);
                HashMap::new()
            }
        };
        Self::next_record(&tags, plan, source_duration)
    }

    /// Parse the existing chain back into records, oldest first
    ///
    /// Stops at the first gap, matching how new records are numbered.
    pub fn records(tags: &HashMap<String, String>) -> Vec<HistoryRecord> {
        let field = |n: u32, name: &str| -> f64 {
            tags.get(&format!("{PREFIX}{n}_{name}"))
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(0.0)
        };

        (1..Self::next_index(tags))
            .map(|n| HistoryRecord {
                index: n,
                source_duration: field(n, "source_duration"),
                start_requested: field(n, "start_requested"),
                start_actual: field(n, "start_actual"),
                end_requested: field(n, "end_requested"),
                end_actual: field(n, "end_actual"),
            })
            .collect()
    }
}
