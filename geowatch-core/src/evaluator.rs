//! Membership Evaluator
//!
//! Turns position samples into transition events for every registered region.
//!
//! # State machine (per region)
//!
//! | From | Sample | To | Event |
//! |------|--------|----|-------|
//! | Unknown | trustworthy | Inside / Outside | if notify flag set |
//! | Inside / Outside | trustworthy, other side | Outside / Inside | if notify flag set |
//! | Inside / Outside | untrustworthy, other side or stale | Unknown | always |
//! | Unknown | untrustworthy | Unknown | none |
//!
//! A sample is untrustworthy for a region when it is near the boundary
//! (`|distance - radius| < accuracy`) and its accuracy is coarser than
//! `radius * accuracy_factor`. Samples without accuracy are always trusted.

use crate::config::MonitorConfig;
use crate::error::GeofenceError;
use crate::geo::distance_meters;
use crate::membership::{MembershipState, Sample, TransitionEvent};
use crate::region::Region;
use crate::registry::{RegionEntry, RegionRegistry};

#[derive(Debug, Clone, Default)]
pub struct MembershipEvaluator {
    config: MonitorConfig,
}

impl MembershipEvaluator {
    pub fn new(config: MonitorConfig) -> Result<Self, GeofenceError> {
        config.validate()?;
        Ok(MembershipEvaluator { config })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Evaluate a sample against every region, updating stored states.
    ///
    /// Returns the transitions to publish, in region insertion order. An
    /// invalid sample is rejected before any state is touched.
    pub fn on_sample(
        &self,
        registry: &mut RegionRegistry,
        sample: &Sample,
    ) -> Result<Vec<TransitionEvent>, GeofenceError> {
        sample.validate()?;

        let events = registry
            .entries_mut()
            .iter_mut()
            .filter_map(|entry| self.evaluate(entry, sample))
            .collect();
        Ok(events)
    }

    /// On-demand state check for one region
    pub fn query_state(
        &self,
        registry: &RegionRegistry,
        region_id: &str,
    ) -> Result<MembershipState, GeofenceError> {
        registry.state_of(region_id)
    }

    /// Whether `accuracy` is good enough to resolve membership at `distance`
    pub fn is_trustworthy(&self, region: &Region, distance: f64, accuracy: Option<f64>) -> bool {
        match accuracy {
            None => true,
            Some(accuracy) => {
                let near_boundary = (distance - region.radius).abs() < accuracy;
                !near_boundary || accuracy <= region.radius * self.config.accuracy_factor
            }
        }
    }

    fn evaluate(&self, entry: &mut RegionEntry, sample: &Sample) -> Option<TransitionEvent> {
        let distance = distance_meters(&entry.region.center, &sample.coordinate);
        let observed = MembershipState::from_contains(distance <= entry.region.radius);
        let current = entry.state;

        if !self.is_trustworthy(&entry.region, distance, sample.accuracy) {
            if current.is_resolved() && (entry.stale || observed != current) {
                log::debug!(
                    "{}: sample at {:.1}m with accuracy {:?} is ambiguous, {} -> unknown",
                    entry.region.id,
                    distance,
                    sample.accuracy,
                    current
                );
                entry.state = MembershipState::Unknown;
                entry.stale = false;
                return Some(transition(entry, current, sample));
            }
            log::trace!(
                "{}: ignoring ambiguous sample at {:.1}m",
                entry.region.id,
                distance
            );
            return None;
        }

        entry.stale = false;
        if observed == current {
            return None;
        }

        entry.state = observed;
        if !entry.region.notifies(observed) {
            log::trace!(
                "{}: {} -> {} (notification disabled)",
                entry.region.id,
                current,
                observed
            );
            return None;
        }

        log::debug!(
            "{}: {} -> {} at {:.1}m",
            entry.region.id,
            current,
            observed,
            distance
        );
        Some(transition(entry, current, sample))
    }
}

fn transition(entry: &RegionEntry, from_state: MembershipState, sample: &Sample) -> TransitionEvent {
    TransitionEvent {
        region_id: entry.region.id.clone(),
        from_state,
        to_state: entry.state,
        timestamp: sample.timestamp,
    }
}
