//! Membership State, Samples and Transition Events

use serde::{Deserialize, Serialize};

use crate::error::GeofenceError;
use crate::geo::Coordinate;

/// Membership of the device in one region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipState {
    /// Not yet determined, or no longer trustworthy
    Unknown,
    Inside,
    Outside,
}

impl Default for MembershipState {
    fn default() -> Self {
        MembershipState::Unknown
    }
}

impl MembershipState {
    /// Map a containment test onto a resolved state
    pub fn from_contains(inside: bool) -> Self {
        if inside {
            MembershipState::Inside
        } else {
            MembershipState::Outside
        }
    }

    /// Inside or Outside
    pub fn is_resolved(&self) -> bool {
        *self != MembershipState::Unknown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipState::Unknown => "unknown",
            MembershipState::Inside => "inside",
            MembershipState::Outside => "outside",
        }
    }
}

impl std::fmt::Display for MembershipState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A position fix delivered by the location provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub coordinate: Coordinate,

    /// Milliseconds since the Unix epoch
    pub timestamp: u64,

    /// Horizontal accuracy radius in meters, if the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Sample {
    pub fn new(coordinate: Coordinate, timestamp: u64) -> Self {
        Sample {
            coordinate,
            timestamp,
            accuracy: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn validate(&self) -> Result<(), GeofenceError> {
        self.coordinate.validate()?;
        if let Some(accuracy) = self.accuracy {
            if !accuracy.is_finite() || accuracy < 0.0 {
                return Err(GeofenceError::InvalidSample(format!(
                    "accuracy {} must be a non-negative number of meters",
                    accuracy
                )));
            }
        }
        Ok(())
    }
}

/// Kind of a transition, derived from the state it moves into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Entered,
    Exited,
    Unknown,
}

/// A change of membership state for one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    pub region_id: String,
    pub from_state: MembershipState,
    pub to_state: MembershipState,
    /// Timestamp of the sample that caused the transition
    pub timestamp: u64,
}

impl TransitionEvent {
    pub fn kind(&self) -> TransitionKind {
        match self.to_state {
            MembershipState::Inside => TransitionKind::Entered,
            MembershipState::Outside => TransitionKind::Exited,
            MembershipState::Unknown => TransitionKind::Unknown,
        }
    }

    /// Human readable status line for this transition
    pub fn status_message(&self) -> String {
        match self.kind() {
            TransitionKind::Entered => format!("Entered geofence: {}", self.region_id),
            TransitionKind::Exited => format!("Exited geofence: {}", self.region_id),
            TransitionKind::Unknown => format!("Geofence state unknown: {}", self.region_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(to_state: MembershipState) -> TransitionEvent {
        TransitionEvent {
            region_id: "A".to_string(),
            from_state: MembershipState::Unknown,
            to_state,
            timestamp: 1000,
        }
    }

    #[test]
    fn test_default_state_unknown() {
        assert_eq!(MembershipState::default(), MembershipState::Unknown);
        assert!(!MembershipState::default().is_resolved());
        assert!(MembershipState::from_contains(true).is_resolved());
    }

    #[test]
    fn test_transition_kind() {
        assert_eq!(event(MembershipState::Inside).kind(), TransitionKind::Entered);
        assert_eq!(event(MembershipState::Outside).kind(), TransitionKind::Exited);
        assert_eq!(event(MembershipState::Unknown).kind(), TransitionKind::Unknown);
    }

    #[test]
    fn test_status_message() {
        assert_eq!(
            event(MembershipState::Inside).status_message(),
            "Entered geofence: A"
        );
        assert_eq!(
            event(MembershipState::Outside).status_message(),
            "Exited geofence: A"
        );
    }

    #[test]
    fn test_sample_validation() {
        let at = Coordinate::new(35.0, 139.0);
        assert!(Sample::new(at, 0).validate().is_ok());
        assert!(Sample::new(at, 0).with_accuracy(0.0).validate().is_ok());
        assert!(Sample::new(at, 0).with_accuracy(-1.0).validate().is_err());
        assert!(Sample::new(at, 0).with_accuracy(f64::NAN).validate().is_err());
        assert!(Sample::new(Coordinate::new(-91.0, 0.0), 0).validate().is_err());
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(event(MembershipState::Inside)).unwrap();
        assert_eq!(json["regionId"], "A");
        assert_eq!(json["fromState"], "unknown");
        assert_eq!(json["toState"], "inside");
        assert_eq!(json["timestamp"], 1000);
    }
}
