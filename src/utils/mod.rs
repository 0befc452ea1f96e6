//! Common utilities and helpers

pub mod path;
pub mod time;

pub use path::{collect_video_files, is_video_file};
pub use time::{format_time, format_timecode, parse_time};
