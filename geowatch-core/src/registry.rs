//! Region Registry
//!
//! Stores monitored regions in insertion order together with the last known
//! membership state of each one. A state exists exactly as long as its region.

use crate::error::GeofenceError;
use crate::membership::MembershipState;
use crate::region::Region;

/// A registered region and its membership state
#[derive(Debug, Clone)]
pub struct RegionEntry {
    pub(crate) region: Region,
    pub(crate) state: MembershipState,
    /// The state was resolved against a definition that has since been updated
    pub(crate) stale: bool,
}

impl RegionEntry {
    fn new(region: Region) -> Self {
        RegionEntry {
            region,
            state: MembershipState::Unknown,
            stale: false,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn state(&self) -> MembershipState {
        self.state
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    // Linear lookup: registries hold a handful of regions, and a Vec keeps
    // insertion order without an extra index
    entries: Vec<RegionEntry>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        RegionRegistry::default()
    }

    /// Register a new region with state Unknown
    pub fn register(&mut self, region: Region) -> Result<(), GeofenceError> {
        region.validate()?;
        if self.contains_id(&region.id) {
            return Err(GeofenceError::DuplicateId(region.id));
        }
        log::debug!(
            "{}: registered, center {} radius {}m",
            region.id,
            region.center,
            region.radius
        );
        self.entries.push(RegionEntry::new(region));
        Ok(())
    }

    /// Replace the definition of an existing region.
    ///
    /// The stored state is kept but marked stale, so the evaluator drops it to
    /// Unknown if the next sample cannot be trusted against the new shape.
    pub fn update(&mut self, region: Region) -> Result<(), GeofenceError> {
        region.validate()?;
        let entry = self
            .entry_mut(&region.id)
            .ok_or_else(|| GeofenceError::NotFound(region.id.clone()))?;
        entry.stale = entry.state.is_resolved();
        entry.region = region;
        Ok(())
    }

    /// Remove a region and its state
    pub fn remove(&mut self, id: &str) -> Result<Region, GeofenceError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.region.id == id)
            .ok_or_else(|| GeofenceError::NotFound(id.to_string()))?;
        log::debug!("{}: removed", id);
        Ok(self.entries.remove(index).region)
    }

    /// Regions in insertion order
    pub fn list(&self) -> Vec<Region> {
        self.entries.iter().map(|e| e.region.clone()).collect()
    }

    pub fn entries(&self) -> &[RegionEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [RegionEntry] {
        &mut self.entries
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.entry(id).map(|e| &e.region)
    }

    pub fn state_of(&self, id: &str) -> Result<MembershipState, GeofenceError> {
        self.entry(id)
            .map(|e| e.state)
            .ok_or_else(|| GeofenceError::NotFound(id.to_string()))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.entry(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: &str) -> Option<&RegionEntry> {
        self.entries.iter().find(|e| e.region.id == id)
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut RegionEntry> {
        self.entries.iter_mut().find(|e| e.region.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn region(id: &str, radius: f64) -> Region {
        Region::new(id, Coordinate::new(35.681236, 139.767125), radius)
    }

    #[test]
    fn test_register_initializes_unknown() {
        let mut registry = RegionRegistry::new();
        registry.register(region("A", 100.0)).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.state_of("A").unwrap(), MembershipState::Unknown);
    }

    #[test]
    fn test_register_duplicate_keeps_first() {
        let mut registry = RegionRegistry::new();
        registry.register(region("A", 100.0)).unwrap();

        let err = registry.register(region("A", 500.0)).unwrap_err();
        assert_eq!(err, GeofenceError::DuplicateId("A".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("A").unwrap().radius, 100.0);
    }

    #[test]
    fn test_register_invalid_region() {
        let mut registry = RegionRegistry::new();
        assert!(matches!(
            registry.register(region("A", 0.0)),
            Err(GeofenceError::InvalidRegion { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_insertion_order() {
        let mut registry = RegionRegistry::new();
        for id in ["c", "a", "b"] {
            registry.register(region(id, 10.0)).unwrap();
        }
        registry.remove("a").unwrap();
        registry.register(region("a", 10.0)).unwrap();

        let ids: Vec<String> = registry.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_remove_not_found() {
        let mut registry = RegionRegistry::new();
        assert_eq!(
            registry.remove("missing").unwrap_err(),
            GeofenceError::NotFound("missing".to_string())
        );
        assert!(registry.state_of("missing").is_err());
    }

    #[test]
    fn test_remove_and_reregister_resets_state() {
        let mut registry = RegionRegistry::new();
        registry.register(region("A", 100.0)).unwrap();
        registry.entries_mut()[0].state = MembershipState::Inside;

        let removed = registry.remove("A").unwrap();
        assert_eq!(removed.id, "A");
        registry.register(region("A", 100.0)).unwrap();
        assert_eq!(registry.state_of("A").unwrap(), MembershipState::Unknown);
    }

    #[test]
    fn test_update_marks_resolved_state_stale() {
        let mut registry = RegionRegistry::new();
        registry.register(region("A", 100.0)).unwrap();
        registry.register(region("B", 100.0)).unwrap();
        registry.entries_mut()[0].state = MembershipState::Outside;

        registry.update(region("A", 200.0)).unwrap();
        registry.update(region("B", 200.0)).unwrap();

        let entries = registry.entries();
        assert_eq!(entries[0].region().radius, 200.0);
        assert_eq!(entries[0].state(), MembershipState::Outside);
        assert!(entries[0].stale);
        // Nothing resolved yet, nothing to invalidate
        assert!(!entries[1].stale);
    }

    #[test]
    fn test_update_errors() {
        let mut registry = RegionRegistry::new();
        assert!(matches!(
            registry.update(region("A", 100.0)),
            Err(GeofenceError::NotFound(_))
        ));
        registry.register(region("A", 100.0)).unwrap();
        assert!(matches!(
            registry.update(region("A", -1.0)),
            Err(GeofenceError::InvalidRegion { .. })
        ));
        assert_eq!(registry.get("A").unwrap().radius, 100.0);
    }
}
