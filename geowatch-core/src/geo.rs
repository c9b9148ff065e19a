//! Spherical Earth Geometry
//!
//! Distance and containment calculations used by the membership evaluator.
//! The earth is modelled as a sphere, which is accurate to well under a meter
//! at geofence scales (meters to tens of kilometers).

use serde::{Deserialize, Serialize};

use crate::error::GeofenceError;
use crate::region::Region;

/// Mean earth radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

/// A WGS84-style position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in degrees, -90 to 90
    pub latitude: f64,
    /// Longitude in degrees, -180 to 180
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and within range.
    ///
    /// Returns a short human readable reason on failure, so callers can wrap
    /// it in the error variant that fits their context.
    pub fn check(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(format!(
                "coordinate ({}, {}) is not finite",
                self.latitude, self.longitude
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} out of range", self.longitude));
        }
        Ok(())
    }

    /// Validate as a sample position
    pub fn validate(&self) -> Result<(), GeofenceError> {
        self.check().map_err(GeofenceError::InvalidSample)
    }

    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lat {:.5}, Lon {:.5}", self.latitude, self.longitude)
    }
}

/// Great-circle distance between two coordinates in meters.
///
/// Uses the haversine formula, which stays well conditioned for the short
/// distances geofences work with.
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude * DEG_TO_RAD;
    let lat2 = b.latitude * DEG_TO_RAD;
    let delta_lat = (b.latitude - a.latitude) * DEG_TO_RAD;
    let delta_lon = (b.longitude - a.longitude) * DEG_TO_RAD;

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h marginally above 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

/// True iff `point` lies within the region's radius (boundary inclusive)
pub fn contains(region: &Region, point: &Coordinate) -> bool {
    distance_meters(&region.center, point) <= region.radius
}

/// Point reached from `origin` after travelling `distance_m` meters along a
/// great circle with initial bearing `bearing_deg` (0 = north, 90 = east).
pub fn destination(origin: &Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let lat1 = origin.latitude * DEG_TO_RAD;
    let lon1 = origin.longitude * DEG_TO_RAD;
    let bearing = bearing_deg * DEG_TO_RAD;
    let angular = distance_m / EARTH_RADIUS_METERS;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    let mut longitude = lon2 * RAD_TO_DEG;
    // Normalize to -180..180
    if longitude > 180.0 {
        longitude -= 360.0;
    } else if longitude < -180.0 {
        longitude += 360.0;
    }

    Coordinate::new(lat2 * RAD_TO_DEG, longitude)
}
