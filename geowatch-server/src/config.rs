//! Config file handling
//!
//! The config file is JSON:
//!
//! ```json
//! {
//!   "monitor": { "accuracyFactor": 0.5 },
//!   "regions": [
//!     {
//!       "id": "TokyoStationGeofence",
//!       "center": { "latitude": 35.681236, "longitude": 139.767125 },
//!       "radius": 100
//!     }
//!   ]
//! }
//! ```
//!
//! Without `--config` the file is looked up in the platform config directory
//! (e.g. `~/.config/geowatch/config.json` on Linux); if it is absent the
//! server starts with no regions.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use geowatch_core::{MonitorConfig, Region};

use crate::error::ServerError;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub regions: Vec<Region>,
}

impl GeofenceConfig {
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GeofenceConfig =
            serde_json::from_str(&contents).map_err(|source| ServerError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.monitor.validate()?;

        log::info!(
            "Loaded {} region(s) from {}",
            config.regions.len(),
            path.display()
        );
        Ok(config)
    }

    /// Platform default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "geowatch", "geowatch")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load the explicitly given file, or the default file if it exists
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ServerError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                log::info!("No config file, starting without regions");
                Ok(GeofenceConfig::default())
            }
        }
    }
}
