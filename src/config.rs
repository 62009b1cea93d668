// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::FacingMode;
use crate::constants::geocoding;
use crate::errors::{AppError, AppResult};
use crate::filters::{FilterKind, FilterSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the platform config directory
pub const APP_DIR: &str = "webcam-wizard";

/// Config file name
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reverse geocoding endpoint (Nominatim compatible)
    pub geocoder_endpoint: String,
    /// Identifying client tag sent with every lookup
    pub geocoder_user_agent: String,
    /// Nominatim zoom level (14 = city)
    pub geocoder_zoom: u8,
    /// HTTP timeout for lookups in seconds
    pub geocoder_timeout_secs: u64,
    /// Camera facing mode used on start
    pub default_facing: FacingMode,
    /// Filter selected on start
    pub default_filter: FilterKind,
    /// Filter intensity selected on start
    pub default_intensity: f32,
    /// Where exported snapshots are written; pictures directory when unset
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoder_endpoint: geocoding::DEFAULT_ENDPOINT.to_string(),
            geocoder_user_agent: geocoding::DEFAULT_USER_AGENT.to_string(),
            geocoder_zoom: geocoding::DEFAULT_ZOOM,
            geocoder_timeout_secs: geocoding::DEFAULT_TIMEOUT.as_secs(),
            default_facing: FacingMode::default(),
            default_filter: FilterKind::None,
            default_intensity: 1.0,
            export_dir: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!("{}: {}", path.display(), e)));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load from the explicit path if given, otherwise from the default location
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Write as pretty JSON, creating the parent directory
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Filter selection to start with
    pub fn default_filter_spec(&self) -> FilterSpec {
        FilterSpec::new(self.default_filter, self.default_intensity)
    }
}
