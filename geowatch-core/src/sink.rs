//! Event Sink
//!
//! The monitor publishes transitions and status lines to an [`EventSink`].
//! How they are shown (UI, log, notification, network) is up to the consumer.

use std::sync::Arc;

use crate::membership::{TransitionEvent, TransitionKind};

/// Consumer of monitor output.
///
/// Callbacks run while the monitor holds its write lock. They must return
/// quickly and must not call back into the monitor.
pub trait EventSink: Send + Sync {
    fn on_transition(&self, event: &TransitionEvent);

    fn on_status(&self, message: &str);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn on_transition(&self, event: &TransitionEvent) {
        (**self).on_transition(event)
    }

    fn on_status(&self, message: &str) {
        (**self).on_status(message)
    }
}

impl<T: EventSink + ?Sized> EventSink for Box<T> {
    fn on_transition(&self, event: &TransitionEvent) {
        (**self).on_transition(event)
    }

    fn on_status(&self, message: &str) {
        (**self).on_status(message)
    }
}

/// Writes everything to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_transition(&self, event: &TransitionEvent) {
        match event.kind() {
            TransitionKind::Unknown => log::warn!(
                "{}: {} -> {} at {}",
                event.region_id,
                event.from_state,
                event.to_state,
                event.timestamp
            ),
            _ => log::info!(
                "{}: {} -> {} at {}",
                event.region_id,
                event.from_state,
                event.to_state,
                event.timestamp
            ),
        }
    }

    fn on_status(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_transition(&self, _event: &TransitionEvent) {}

    fn on_status(&self, _message: &str) {}
}
