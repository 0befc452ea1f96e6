//! Session files
//!
//! A session lists the sources to load, the groups to form and the marker
//! edits to replay, in that order. Relative paths are resolved against the
//! directory holding the session file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::catalog::Catalog;
use crate::domain::model::{MarkerKind, NodeId};
use crate::domain::rules::MarkerSynchronizer;
use crate::error::{TrimError, TrimResult};
use crate::output::naming::normalize;
use crate::ports::ProbePort;
use crate::utils::path::{collect_video_files, resolve};
use crate::utils::time::parse_time;

/// A time given either as a number of seconds or as a time string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Seconds(f64),
    Text(String),
}

impl TimeValue {
    pub fn seconds(&self) -> TrimResult<f64> {
        match self {
            TimeValue::Seconds(seconds) => Ok(*seconds),
            TimeValue::Text(text) => parse_time(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub clips: Vec<PathBuf>,
}

/// One marker edit; `target` is a group name or a clip path
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerSpec {
    pub target: String,
    pub kind: String,
    pub at: TimeValue,
}

/// Parsed session file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Session {
    pub output_dir: Option<PathBuf>,
    pub sources: Vec<PathBuf>,
    pub groups: Vec<GroupSpec>,
    pub markers: Vec<MarkerSpec>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Session {
    /// Read and parse a session file
    pub fn load(path: &Path) -> TrimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TrimError::Session {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        Self::from_toml_str(&content, base_dir)
    }

    /// Parse session text; relative paths resolve against `base_dir`
    pub fn from_toml_str(content: &str, base_dir: impl Into<PathBuf>) -> TrimResult<Self> {
        let mut session: Session = toml::from_str(content).map_err(|e| TrimError::Session {
            message: e.to_string(),
        })?;
        session.base_dir = base_dir.into();
        Ok(session)
    }

    fn path(&self, path: &Path) -> PathBuf {
        normalize(&resolve(&self.base_dir, path))
    }

    /// Destination directory, resolved against the session location
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.output_dir.as_deref().map(|dir| self.path(dir))
    }

    /// Source files after directory expansion, in listing order
    pub fn source_files(&self) -> TrimResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for source in &self.sources {
            let path = self.path(source);
            if path.is_dir() {
                let found = collect_video_files(&path)?;
                debug!("{} expands to {} videos", path.display(), found.len());
                files.extend(found.iter().map(|file| normalize(file)));
            } else if path.is_file() {
                files.push(path);
            } else {
                return Err(TrimError::Session {
                    message: format!("source not found: {}", path.display()),
                });
            }
        }
        Ok(files)
    }

    /// Probe the sources, form the groups and replay the marker edits
    pub async fn build_catalog(&self, probe: &dyn ProbePort) -> TrimResult<Catalog> {
        let mut catalog = Catalog::new();
        for file in self.source_files()? {
            catalog.add_clip(&file, probe).await;
        }

        for spec in &self.groups {
            let mut ids = Vec::with_capacity(spec.clips.len());
            for clip in &spec.clips {
                let path = self.path(clip);
                let id = catalog.find_by_path(&path).ok_or_else(|| TrimError::Session {
                    message: format!("group member is not a source: {}", path.display()),
                })?;
                ids.push(id);
            }
            catalog.group_selection(spec.name.as_deref(), &ids)?;
        }

        for marker in &self.markers {
            let kind = MarkerKind::parse(&marker.kind).ok_or_else(|| TrimError::Session {
                message: format!("unknown marker kind: {}", marker.kind),
            })?;
            let value = marker.at.seconds()?;
            let target = self.marker_target(&catalog, &marker.target)?;
            let touched = MarkerSynchronizer::set_marker(&mut catalog, target, kind, value)?;
            debug!("{} marker on {} touched {} clips", kind, marker.target, touched.len());
        }

        info!(
            "Session loaded: {} clips, {} ready",
            catalog.clips().count(),
            catalog.clips().filter(|clip| clip.ready).count()
        );
        Ok(catalog)
    }

    fn marker_target(&self, catalog: &Catalog, target: &str) -> TrimResult<NodeId> {
        if let Some(group) = catalog.find_group_by_name(target) {
            return Ok(NodeId::Group(group));
        }
        catalog
            .find_by_path(&self.path(Path::new(target)))
            .map(NodeId::Clip)
            .ok_or_else(|| TrimError::Session {
                message: format!("marker target is neither a group nor a source: {}", target),
            })
    }
}
