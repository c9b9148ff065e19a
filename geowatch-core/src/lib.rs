//! Geowatch Core
//!
//! Platform-independent geofence membership monitoring. Given a stream of
//! position samples this crate keeps track of which circular regions the
//! device is in and publishes Entered / Exited / Unknown transitions.
//!
//! The crate does no I/O: samples are pushed in by a location provider, and
//! output goes to an [`EventSink`] supplied by the application.
//!
//! # Modules
//!
//! - **geo**: haversine distance and containment
//! - **region**: circular region definition
//! - **registry**: monitored regions and their membership state
//! - **evaluator**: sample evaluation with accuracy debouncing
//! - **monitor**: thread-safe facade publishing to an event sink
//!
//! # Example
//!
//! ```rust
//! use geowatch_core::{Coordinate, GeofenceMonitor, LogSink, MonitorConfig, Region, Sample};
//!
//! let monitor = GeofenceMonitor::new(MonitorConfig::default(), LogSink).unwrap();
//! let tokyo_station = Coordinate::new(35.681236, 139.767125);
//! monitor
//!     .start_monitoring(Region::new("TokyoStationGeofence", tokyo_station, 100.0))
//!     .unwrap();
//!
//! let events = monitor
//!     .on_sample(Sample::new(tokyo_station, 1_700_000_000_000).with_accuracy(5.0))
//!     .unwrap();
//! assert_eq!(events.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod geo;
pub mod membership;
pub mod monitor;
pub mod region;
pub mod registry;
pub mod sink;

pub use config::{MonitorConfig, DEFAULT_ACCURACY_FACTOR};
pub use error::GeofenceError;
pub use evaluator::MembershipEvaluator;
pub use geo::{contains, destination, distance_meters, Coordinate, EARTH_RADIUS_METERS};
pub use membership::{MembershipState, Sample, TransitionEvent, TransitionKind};
pub use monitor::{GeofenceMonitor, RegionStatus, STATUS_NOT_STARTED};
pub use region::Region;
pub use registry::{RegionEntry, RegionRegistry};
pub use sink::{EventSink, LogSink, NullSink};
