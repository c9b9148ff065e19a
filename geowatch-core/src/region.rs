//! Circular Geofence Regions

use serde::{Deserialize, Serialize};

use crate::error::GeofenceError;
use crate::geo::Coordinate;
use crate::membership::MembershipState;

fn default_notify() -> bool {
    true
}

/// A circular geofence
///
/// Regions are immutable once registered; use the registry's `update` to
/// replace a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Unique identifier (e.g., "TokyoStationGeofence")
    pub id: String,

    /// Center of the circle
    pub center: Coordinate,

    /// Radius in meters
    pub radius: f64,

    /// Publish an event when the device enters the region
    #[serde(default = "default_notify")]
    pub notify_on_entry: bool,

    /// Publish an event when the device leaves the region
    #[serde(default = "default_notify")]
    pub notify_on_exit: bool,
}

impl Region {
    /// Create a region that notifies on both entry and exit
    pub fn new(id: &str, center: Coordinate, radius: f64) -> Self {
        Region {
            id: id.to_string(),
            center,
            radius,
            notify_on_entry: true,
            notify_on_exit: true,
        }
    }

    pub fn with_notify(mut self, on_entry: bool, on_exit: bool) -> Self {
        self.notify_on_entry = on_entry;
        self.notify_on_exit = on_exit;
        self
    }

    pub fn validate(&self) -> Result<(), GeofenceError> {
        if self.id.trim().is_empty() {
            return Err(GeofenceError::invalid_region(&self.id, "id must not be empty"));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(GeofenceError::invalid_region(
                &self.id,
                format!("radius {} must be a positive number of meters", self.radius),
            ));
        }
        self.center
            .check()
            .map_err(|reason| GeofenceError::invalid_region(&self.id, reason))
    }

    /// Whether a change into `state` should be published for this region
    pub fn notifies(&self, state: MembershipState) -> bool {
        match state {
            MembershipState::Inside => self.notify_on_entry,
            MembershipState::Outside => self.notify_on_exit,
            MembershipState::Unknown => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokyo() -> Region {
        Region::new("TokyoStationGeofence", Coordinate::new(35.681236, 139.767125), 100.0)
    }

    #[test]
    fn test_region_valid() {
        assert!(tokyo().validate().is_ok());
    }

    #[test]
    fn test_region_invalid_radius() {
        for radius in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let mut r = tokyo();
            r.radius = radius;
            assert!(
                matches!(r.validate(), Err(GeofenceError::InvalidRegion { .. })),
                "radius {} accepted",
                radius
            );
        }
    }

    #[test]
    fn test_region_invalid_center() {
        let mut r = tokyo();
        r.center = Coordinate::new(95.0, 0.0);
        let err = r.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid region 'TokyoStationGeofence': latitude 95 out of range"
        );
    }

    #[test]
    fn test_region_empty_id() {
        let r = Region::new(" ", Coordinate::new(0.0, 0.0), 10.0);
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_notifies() {
        let r = tokyo().with_notify(true, false);
        assert!(r.notifies(MembershipState::Inside));
        assert!(!r.notifies(MembershipState::Outside));
        assert!(r.notifies(MembershipState::Unknown));
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{"id":"A","center":{"latitude":1.0,"longitude":2.0},"radius":50}"#;
        let r: Region = serde_json::from_str(json).unwrap();
        assert_eq!(r, Region::new("A", Coordinate::new(1.0, 2.0), 50.0));

        let json = r#"{"id":"B","center":{"latitude":1.0,"longitude":2.0},"radius":50,"notifyOnExit":false}"#;
        let r: Region = serde_json::from_str(json).unwrap();
        assert!(r.notify_on_entry);
        assert!(!r.notify_on_exit);
    }
}
