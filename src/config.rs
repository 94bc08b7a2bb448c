//! Run configuration: search root and recognized media suffixes.
//!
//! The configuration file is required. It may be written as TOML or JSON
//! (chosen by the `.json` file extension):
//!
//! ```toml
//! default_path = "/srv/downloads"
//! video_extensions = [".mkv", ".mp4", ".avi"]
//! subtitle_extensions = [".srt", ".ass"]
//! ```
//!
//! ```json
//! {
//!   "default_path": "/srv/downloads",
//!   "video_extensions": [".mkv", ".mp4"],
//!   "subtitle_extensions": [".srt"]
//! }
//! ```

use crate::file_category::ExtensionSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File names probed in the working directory when no config is given.
const LOCAL_CONFIG_NAMES: [&str; 2] = ["mediabot.toml", "mediabot.json"];

/// Errors that can occur while loading and validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file at the given or any default location.
    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The file could not be read.
    #[error("Could not read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML or JSON syntax error, or a required key is missing.
    #[error("Invalid config file {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    /// `default_path` is empty.
    #[error("Invalid config: 'default_path' must not be empty")]
    EmptyDefaultPath,

    /// An extension entry is empty after trimming.
    #[error("Invalid config: empty entry in '{key}'")]
    InvalidExtension { key: &'static str },

    /// The same suffix appears in both the video and subtitle lists.
    #[error("Invalid config: '{extension}' is listed as both video and subtitle")]
    OverlappingExtension { extension: String },
}

/// The configuration record. All three keys are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Root scanned when no path is given on the command line.
    pub default_path: PathBuf,
    /// Video suffixes including the leading dot, e.g. `".mkv"`.
    pub video_extensions: Vec<String>,
    /// Subtitle suffixes including the leading dot, e.g. `".srt"`.
    pub subtitle_extensions: Vec<String>,
}

impl MediaConfig {
    /// Locate, parse and validate the configuration.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `mediabot.toml` then `mediabot.json` in the current directory
    /// 3. `~/.config/mediabot/config.toml`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` when none of the locations holds
    /// a file, and a parse or validation error for a malformed file.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        for name in LOCAL_CONFIG_NAMES {
            let local_config = PathBuf::from(name);
            if local_config.exists() {
                return Self::load_from_file(&local_config);
            }
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("mediabot")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Err(ConfigError::ConfigNotFound(PathBuf::from(
            LOCAL_CONFIG_NAMES[0],
        )))
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        debug!(path = %path.display(), "Loading config");

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
        .map_err(|reason| ConfigError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        })?;

        config.validated()
    }

    /// Parse a TOML document without validating it.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Parse a JSON document without validating it.
    pub fn from_json_str(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Normalize extension entries and check the record's invariants.
    ///
    /// Entries are trimmed and lower-cased, and a leading dot is added when
    /// missing. Duplicates collapse. The two lists must be disjoint.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.default_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDefaultPath);
        }

        let video = normalize_extensions(&self.video_extensions, "video_extensions")?;
        let subtitle = normalize_extensions(&self.subtitle_extensions, "subtitle_extensions")?;

        if let Some(extension) = video.intersection(&subtitle).next() {
            return Err(ConfigError::OverlappingExtension {
                extension: extension.clone(),
            });
        }

        Ok(Self {
            default_path: self.default_path,
            video_extensions: video.into_iter().collect(),
            subtitle_extensions: subtitle.into_iter().collect(),
        })
    }

    /// The recognized media suffixes as an [`ExtensionSet`].
    pub fn extension_set(&self) -> ExtensionSet {
        ExtensionSet::new(&self.video_extensions, &self.subtitle_extensions)
    }
}

fn normalize_extensions(
    entries: &[String],
    key: &'static str,
) -> Result<BTreeSet<String>, ConfigError> {
    entries
        .iter()
        .map(|entry| {
            let trimmed = entry.trim().to_lowercase();
            if trimmed.is_empty() || trimmed == "." {
                Err(ConfigError::InvalidExtension { key })
            } else if trimmed.starts_with('.') {
                Ok(trimmed)
            } else {
                Ok(format!(".{trimmed}"))
            }
        })
        .collect()
}
