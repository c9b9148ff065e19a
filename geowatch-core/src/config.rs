//! Monitor configuration

use serde::{Deserialize, Serialize};

use crate::error::GeofenceError;

/// Default accuracy threshold as a fraction of the region radius
pub const DEFAULT_ACCURACY_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    /// A sample near a boundary is only trusted when its accuracy is at most
    /// `radius * accuracy_factor`
    pub accuracy_factor: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            accuracy_factor: DEFAULT_ACCURACY_FACTOR,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), GeofenceError> {
        if !self.accuracy_factor.is_finite() || self.accuracy_factor <= 0.0 {
            return Err(GeofenceError::InvalidConfig(format!(
                "accuracy factor {} must be positive",
                self.accuracy_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_factor() {
        assert_eq!(MonitorConfig::default().accuracy_factor, 0.5);
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_factor() {
        for factor in [0.0, -0.5, f64::NAN] {
            let config = MonitorConfig {
                accuracy_factor: factor,
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_deserialize_missing_fields() {
        let config: MonitorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MonitorConfig::default());

        let config: MonitorConfig = serde_json::from_str(r#"{"accuracyFactor":0.25}"#).unwrap();
        assert_eq!(config.accuracy_factor, 0.25);
    }
}
