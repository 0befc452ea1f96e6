//! vtrim batch video trimmer library
//!
//! Lossless trimming of many videos at once. Markers are kept per clip or
//! synchronized across a group, snapped back to keyframes, and cut with
//! stream copy. Each output carries its trim history as container tags.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod output;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{CancellationFlag, ExportEvent, ExportPipeline, ExportSummary, PipelineState};
pub use domain::catalog::Catalog;
pub use domain::errors::DomainError;
pub use domain::model::{Clip, ClipId, Group, GroupId, MarkerKind, MediaInfo, Node, NodeId};
pub use domain::rules::MarkerSynchronizer;
pub use error::{TrimError, TrimResult};
pub use output::{HistoryRecord, MetadataHistory};
pub use planner::{TrimPlan, TrimPlanner};
