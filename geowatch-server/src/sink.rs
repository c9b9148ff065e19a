//! Broadcast event sink
//!
//! Fans monitor output out to any number of async subscribers (WebSocket
//! clients, the stdout forwarder). Sending never blocks the monitor; a
//! subscriber that falls behind by more than the channel capacity loses the
//! oldest events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_graceful_shutdown::SubsystemHandle;

use geowatch_core::{EventSink, LogSink, TransitionEvent};

use crate::error::ServerError;
use crate::Session;

/// Message published to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MonitorEvent {
    Transition(TransitionEvent),
    Status { message: String },
}

pub struct BroadcastSink {
    tx: broadcast::Sender<MonitorEvent>,
    log: LogSink,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        BroadcastSink { tx, log: LogSink }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: MonitorEvent) {
        // Err only means nobody is subscribed right now
        if self.tx.send(event).is_err() {
            log::trace!("No subscribers for monitor event");
        }
    }
}

impl EventSink for BroadcastSink {
    fn on_transition(&self, event: &TransitionEvent) {
        self.log.on_transition(event);
        self.send(MonitorEvent::Transition(event.clone()));
    }

    fn on_status(&self, message: &str) {
        self.log.on_status(message);
        self.send(MonitorEvent::Status {
            message: message.to_string(),
        });
    }
}

/// Print every monitor event on stdout as one JSON line
pub async fn forward_output(session: Session, subsys: SubsystemHandle) -> Result<(), ServerError> {
    let mut rx = session.monitor.sink().subscribe();
    log::debug!("Forwarding monitor events to stdout");

    loop {
        tokio::select! {
            _ = subsys.on_shutdown_requested() => {
                return Ok(());
            },
            r = rx.recv() => {
                match r {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => log::error!("stdout: cannot encode {:?}: {}", event, e),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("stdout: skipped {} monitor events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geowatch_core::MembershipState;

    fn event() -> TransitionEvent {
        TransitionEvent {
            region_id: "A".to_string(),
            from_state: MembershipState::Outside,
            to_state: MembershipState::Inside,
            timestamp: 42,
        }
    }

    #[test]
    fn test_send_without_subscribers() {
        let sink = BroadcastSink::new(4);
        sink.on_transition(&event());
        sink.on_status("Entered geofence: A");
    }

    #[test]
    fn test_subscriber_receives_in_order() {
        let sink = BroadcastSink::new(4);
        let mut rx = sink.subscribe();

        sink.on_transition(&event());
        sink.on_status("Entered geofence: A");

        assert_eq!(rx.try_recv().unwrap(), MonitorEvent::Transition(event()));
        assert_eq!(
            rx.try_recv().unwrap(),
            MonitorEvent::Status {
                message: "Entered geofence: A".to_string()
            }
        );
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(MonitorEvent::Transition(event())).unwrap();
        assert_eq!(json["type"], "transition");
        assert_eq!(json["regionId"], "A");
        assert_eq!(json["toState"], "inside");

        let json = serde_json::to_value(MonitorEvent::Status {
            message: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "status", "message": "hello"}));
    }
}
