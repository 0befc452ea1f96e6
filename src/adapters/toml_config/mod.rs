// TOML config adapter - Configuration loading using TOML files
//
// Precedence: built-in defaults < config file < environment < command line.
// The resulting `Settings` value is passed explicitly to whoever needs it.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use crate::error::{TrimError, TrimResult};
use crate::output::{DEFAULT_COMMENT, DEFAULT_CROP_SUFFIX};

/// Config files tried in order when no explicit path is given
pub const CONFIG_SEARCH_PATHS: [&str; 2] = ["vtrim.toml", "config/vtrim.toml"];

/// How source files are probed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeBackend {
    /// Spawn the ffprobe executable
    Ffprobe,
    /// Read containers in-process (needs the `libav` feature)
    Libav,
}

/// External tool locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub ffprobe: PathBuf,
    pub ffmpeg: PathBuf,
    pub probe_backend: ProbeBackend,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffprobe: PathBuf::from("ffprobe"),
            ffmpeg: PathBuf::from("ffmpeg"),
            probe_backend: ProbeBackend::Ffprobe,
        }
    }
}

/// Export behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Appended to the file stem when exporting into the source directory
    pub crop_suffix: String,
    /// Value of the `comment` tag on trimmed files
    pub comment: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            crop_suffix: DEFAULT_CROP_SUFFIX.to_string(),
            comment: DEFAULT_COMMENT.to_string(),
        }
    }
}

/// Logging output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tools: ToolSettings,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
    /// File the settings were read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Parse settings from TOML text; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> TrimResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Defaults overlaid with a config file
    ///
    /// An explicit path must exist. Without one, the first existing entry of
    /// `CONFIG_SEARCH_PATHS` is used, or plain defaults if none exists.
    pub fn load(explicit: Option<&Path>) -> TrimResult<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(TrimError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                Some(path.to_path_buf())
            }
            None => CONFIG_SEARCH_PATHS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.is_file()),
        };

        match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                let mut settings = Self::from_toml_str(&content).map_err(|e| TrimError::Config {
                    message: format!("{}: {}", path.display(), e),
                })?;
                settings.source = Some(path);
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `VTRIM_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("VTRIM_FFPROBE") {
            self.tools.ffprobe = PathBuf::from(value);
        }
        if let Some(value) = lookup("VTRIM_FFMPEG") {
            self.tools.ffmpeg = PathBuf::from(value);
        }
        if let Some(value) = lookup("VTRIM_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = lookup("VTRIM_CROP_SUFFIX") {
            self.export.crop_suffix = value;
        }
    }

    /// Reject values the rest of the program cannot work with
    pub fn validate(&self) -> TrimResult<()> {
        if self.tools.ffprobe.as_os_str().is_empty() || self.tools.ffmpeg.as_os_str().is_empty() {
            return Err(TrimError::Config {
                message: "tool paths must not be empty".to_string(),
            });
        }
        if self.export.crop_suffix.is_empty() {
            return Err(TrimError::Config {
                message: "crop_suffix must not be empty".to_string(),
            });
        }
        if tracing::Level::from_str(&self.logging.level).is_err() {
            return Err(TrimError::Config {
                message: format!(
                    "invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                    self.logging.level
                ),
            });
        }
        Ok(())
    }
}
