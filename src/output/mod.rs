//! Output naming and provenance tags

pub mod history;
pub mod naming;

pub use history::{HistoryRecord, MetadataHistory, DEFAULT_COMMENT};
pub use naming::{output_path, DEFAULT_CROP_SUFFIX};
