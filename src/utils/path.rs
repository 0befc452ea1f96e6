//! Path utilities for locating source videos

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::TrimResult;

/// Extensions treated as video sources when scanning directories
pub const VIDEO_EXTENSIONS: [&str; 9] = ["mp4", "mkv", "avi", "mov", "flv", "webm", "wmv", "mpeg", "mpg"];

/// True for paths with a known video extension (case-insensitive)
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// Video files below `dir`, sorted by path
pub fn collect_video_files(dir: &Path) -> TrimResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && is_video_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Resolve `path` against `base` unless it is already absolute
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
