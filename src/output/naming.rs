//! Output file naming

use std::path::{Component, Path, PathBuf};

/// Suffix appended when trimming into the source directory
pub const DEFAULT_CROP_SUFFIX: &str = "_crop";

/// Lexically normalize a path: drop `.` segments, fold `..`, treat an empty
/// path as the current directory.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_in_name = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if ends_in_name {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

/// Whether two directory paths point at the same place
pub fn same_directory(a: &Path, b: &Path) -> bool {
    if normalize(a) == normalize(b) {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Destination path for a trimmed copy of `source` inside `dest_dir`
///
/// Writing next to the source would overwrite it, so the stem gets `suffix`
/// in that case. Any other directory keeps the original file name.
pub fn output_path(source: &Path, dest_dir: &Path, suffix: &str) -> PathBuf {
    let source_dir = source.parent().unwrap_or_else(|| Path::new(""));
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    if !same_directory(source_dir, dest_dir) {
        return dest_dir.join(file_name);
    }

    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    let renamed = match source.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    dest_dir.join(renamed)
}
