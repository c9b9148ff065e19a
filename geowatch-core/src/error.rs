//! Error types for geofence monitoring.

use thiserror::Error;

/// Errors reported by the registry, evaluator and monitor.
///
/// All variants are recoverable; none of them leave the monitor in a
/// partially updated state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeofenceError {
    #[error("Region '{0}' is already registered")]
    DuplicateId(String),

    #[error("Region '{0}' not found")]
    NotFound(String),

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid region '{id}': {reason}")]
    InvalidRegion { id: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GeofenceError {
    pub(crate) fn invalid_region(id: &str, reason: impl Into<String>) -> Self {
        GeofenceError::InvalidRegion {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            GeofenceError::DuplicateId("A".into()).to_string(),
            "Region 'A' is already registered"
        );
        assert_eq!(
            GeofenceError::invalid_region("B", "radius must be positive").to_string(),
            "Invalid region 'B': radius must be positive"
        );
    }
}
