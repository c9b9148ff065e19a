use std::io;
use std::path::PathBuf;

use thiserror::Error;

use geowatch_core::GeofenceError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Shutdown")]
    Shutdown,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot read config file {path}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid sample message: {0}")]
    SampleFormat(#[from] serde_json::Error),

    #[error(transparent)]
    Geofence(#[from] GeofenceError),
}
