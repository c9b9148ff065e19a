//! Geofence Monitor
//!
//! Thread-safe owner of one registry + evaluator pair.
//!
//! Writers (`on_sample`, `register`, `update`, `remove`, `stop_monitoring`)
//! take the write lock and publish to the sink before releasing it, so a
//! state change and its event are never observed apart, and once
//! `stop_monitoring` returns no event for that region can follow. Readers
//! (`query_state`, `list`, `snapshot`) share the read lock.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::error::GeofenceError;
use crate::evaluator::MembershipEvaluator;
use crate::membership::{MembershipState, Sample, TransitionEvent};
use crate::region::Region;
use crate::registry::RegionRegistry;
use crate::sink::EventSink;

/// Status before any region has been registered
pub const STATUS_NOT_STARTED: &str = "Monitoring not started";

/// A region together with its current membership state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStatus {
    #[serde(flatten)]
    pub region: Region,
    pub state: MembershipState,
}

struct MonitorState {
    registry: RegionRegistry,
    last_sample: Option<Sample>,
    status: String,
}

pub struct GeofenceMonitor<S: EventSink> {
    evaluator: MembershipEvaluator,
    state: RwLock<MonitorState>,
    sink: S,
}

impl<S: EventSink> GeofenceMonitor<S> {
    pub fn new(config: MonitorConfig, sink: S) -> Result<Self, GeofenceError> {
        Ok(GeofenceMonitor {
            evaluator: MembershipEvaluator::new(config)?,
            state: RwLock::new(MonitorState {
                registry: RegionRegistry::new(),
                last_sample: None,
                status: STATUS_NOT_STARTED.to_string(),
            }),
            sink,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        self.evaluator.config()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // Every mutation completes before the sink is called, so a poisoned lock
    // still guards consistent data
    fn read(&self) -> RwLockReadGuard<'_, MonitorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MonitorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_status(&self, state: &mut MonitorState, message: String) {
        state.status = message;
        self.sink.on_status(&state.status);
    }

    /// Register a region without publishing anything
    pub fn register(&self, region: Region) -> Result<(), GeofenceError> {
        self.write().registry.register(region)
    }

    /// Start monitoring a region unless one with the same id is already
    /// monitored.
    ///
    /// Returns `Ok(false)` when the id is already registered; the existing
    /// region and its state are left untouched. On success the current state
    /// of the new region is reported as a status line.
    pub fn start_monitoring(&self, region: Region) -> Result<bool, GeofenceError> {
        let mut state = self.write();
        let id = region.id.clone();

        if state.registry.contains_id(&id) {
            log::debug!("{}: already monitored", id);
            self.publish_status(
                &mut state,
                format!("Geofence is already being monitored: {}", id),
            );
            return Ok(false);
        }

        state.registry.register(region)?;
        log::info!("{}: monitoring started", id);
        self.publish_status(&mut state, format!("Monitoring started: {}", id));

        let current = state.registry.state_of(&id)?;
        self.publish_status(&mut state, describe_state(&id, current));
        Ok(true)
    }

    /// Stop monitoring a region. No events for it are published after this
    /// returns.
    pub fn stop_monitoring(&self, id: &str) -> Result<Region, GeofenceError> {
        let mut state = self.write();
        let region = state.registry.remove(id)?;
        log::info!("{}: monitoring stopped", id);
        self.publish_status(&mut state, format!("Monitoring stopped: {}", id));
        Ok(region)
    }

    /// Remove a region without publishing a status line.
    ///
    /// The silent counterpart of [`register`](Self::register), for hosts that
    /// manage regions themselves. It gives the same guarantee as
    /// [`stop_monitoring`](Self::stop_monitoring): no events for the region
    /// are published after it returns.
    pub fn remove(&self, id: &str) -> Result<Region, GeofenceError> {
        self.write().registry.remove(id)
    }

    /// Replace a region definition
    pub fn update(&self, region: Region) -> Result<(), GeofenceError> {
        self.write().registry.update(region)
    }

    /// Feed a position sample and publish the resulting transitions.
    ///
    /// Each transition is followed by its status line. Once the sample is
    /// recorded as the current location, the state of every monitored region
    /// is published as a status line as well, so `status()` always describes
    /// the latest fix.
    pub fn on_sample(&self, sample: Sample) -> Result<Vec<TransitionEvent>, GeofenceError> {
        let mut guard = self.write();
        let state = &mut *guard;

        let events = match self.evaluator.on_sample(&mut state.registry, &sample) {
            Ok(events) => events,
            Err(e) => {
                log::warn!("Rejected sample {:?}: {}", sample, e);
                return Err(e);
            }
        };
        log::trace!(
            "Sample {} accuracy {:?}: {} transition(s)",
            sample.coordinate,
            sample.accuracy,
            events.len()
        );
        state.last_sample = Some(sample);

        for event in &events {
            self.sink.on_transition(event);
            self.publish_status(state, event.status_message());
        }

        let current: Vec<String> = state
            .registry
            .entries()
            .iter()
            .map(|e| describe_state(&e.region().id, e.state()))
            .collect();
        for message in current {
            self.publish_status(state, message);
        }
        Ok(events)
    }

    /// Current state of a region
    pub fn query_state(&self, id: &str) -> Result<MembershipState, GeofenceError> {
        self.evaluator.query_state(&self.read().registry, id)
    }

    /// Like [`query_state`](Self::query_state), but also publishes the state
    /// as a status line
    pub fn request_state(&self, id: &str) -> Result<MembershipState, GeofenceError> {
        let mut state = self.write();
        let current = self.evaluator.query_state(&state.registry, id)?;
        self.publish_status(&mut state, describe_state(id, current));
        Ok(current)
    }

    /// Regions in insertion order
    pub fn list(&self) -> Vec<Region> {
        self.read().registry.list()
    }

    /// Regions with their states, taken under a single read lock
    pub fn snapshot(&self) -> Vec<RegionStatus> {
        self.read()
            .registry
            .entries()
            .iter()
            .map(|e| RegionStatus {
                region: e.region().clone(),
                state: e.state(),
            })
            .collect()
    }

    /// Last accepted sample
    pub fn current_location(&self) -> Option<Sample> {
        self.read().last_sample
    }

    /// Last published status line
    pub fn status(&self) -> String {
        self.read().status.clone()
    }
}

fn describe_state(id: &str, state: MembershipState) -> String {
    match state {
        MembershipState::Inside => format!("Currently inside geofence: {}", id),
        MembershipState::Outside => format!("Currently outside geofence: {}", id),
        MembershipState::Unknown => format!("Geofence state unknown: {}", id),
    }
}
