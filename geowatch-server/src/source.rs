//! Position sample sources
//!
//! Samples are JSON objects, one per UDP datagram or one per replay line:
//!
//! ```json
//! {"latitude": 35.681236, "longitude": 139.767125, "accuracy": 5.0, "timestamp": 1700000000000}
//! ```
//!
//! `accuracy` and `timestamp` are optional; a missing timestamp is replaced
//! by the time of arrival.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tokio::time::sleep;
use tokio_graceful_shutdown::SubsystemHandle;

use geowatch_core::{Coordinate, Sample, TransitionEvent};

use crate::error::ServerError;
use crate::Session;

const MAX_DATAGRAM_LEN: usize = 2048;

/// Wall clock in milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Wire format of a position sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleMessage {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl SampleMessage {
    pub fn parse(data: &[u8]) -> Result<Self, ServerError> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn into_sample(self) -> Sample {
        Sample {
            coordinate: Coordinate::new(self.latitude, self.longitude),
            timestamp: self.timestamp.unwrap_or_else(now_ms),
            accuracy: self.accuracy,
        }
    }
}

/// Parse and evaluate one sample message, logging anything that goes wrong.
///
/// Bad input from a provider is never fatal; it is reported and dropped.
pub fn ingest(session: &Session, data: &[u8], from: &str) -> Option<Vec<TransitionEvent>> {
    let message = match SampleMessage::parse(data) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("{}: {}", from, e);
            return None;
        }
    };
    match session.monitor.on_sample(message.into_sample()) {
        Ok(events) => Some(events),
        Err(e) => {
            log::warn!("{}: {}", from, e);
            None
        }
    }
}

/// Receives samples as UDP datagrams
pub struct UdpSampleReceiver {
    session: Session,
    addr: SocketAddrV4,
}

impl UdpSampleReceiver {
    pub fn new(session: Session, port: u16) -> Self {
        UdpSampleReceiver {
            session,
            addr: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port),
        }
    }

    pub async fn run(self, subsys: SubsystemHandle) -> Result<(), ServerError> {
        let socket = UdpSocket::bind(self.addr).await?;
        log::info!("Listening for position samples on udp {}", socket.local_addr()?);

        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("udp {}: shutdown", self.addr);
                    return Ok(());
                },
                r = socket.recv_from(&mut buf) => {
                    match r {
                        Ok((len, from)) => {
                            ingest(&self.session, &buf[..len], &from.to_string());
                        }
                        Err(e) => {
                            log::error!("udp {}: receive error: {}", self.addr, e);
                            return Err(ServerError::Io(e));
                        }
                    }
                }
            }
        }
    }
}

/// Feeds samples from a JSON-lines file at a fixed interval
pub struct ReplaySource {
    session: Session,
    path: PathBuf,
    interval: Duration,
}

impl ReplaySource {
    pub fn new(session: Session, path: PathBuf, interval: Duration) -> Self {
        ReplaySource {
            session,
            path,
            interval,
        }
    }

    pub async fn run(self, subsys: SubsystemHandle) -> Result<(), ServerError> {
        match self.replay(&subsys).await {
            Err(ServerError::Shutdown) => Ok(()),
            r => r,
        }
    }

    async fn replay(&self, subsys: &SubsystemHandle) -> Result<(), ServerError> {
        let file = File::open(&self.path).await?;
        let mut lines = BufReader::new(file).lines();
        let source = self.path.display().to_string();
        let mut line_no = 0usize;

        log::info!("Replaying samples from {}", source);
        loop {
            let line = tokio::select! {
                _ = subsys.on_shutdown_requested() => return Err(ServerError::Shutdown),
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                log::info!("{}: replay finished after {} line(s)", source, line_no);
                return Ok(());
            };
            line_no += 1;

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            ingest(&self.session, line.as_bytes(), &format!("{}:{}", source, line_no));

            tokio::select! {
                _ = subsys.on_shutdown_requested() => return Err(ServerError::Shutdown),
                _ = sleep(self.interval) => {},
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeofenceConfig;
    use crate::tests::test_args;
    use crate::SessionInner;
    use geowatch_core::{MembershipState, Region, TransitionKind};

    fn session() -> Session {
        let config = GeofenceConfig {
            regions: vec![Region::new(
                "A",
                Coordinate::new(35.681236, 139.767125),
                100.0,
            )],
            ..Default::default()
        };
        SessionInner::new(test_args(), config).unwrap()
    }

    #[test]
    fn test_parse_full_message() {
        let m = SampleMessage::parse(
            br#"{"latitude":35.0,"longitude":139.0,"accuracy":5.5,"timestamp":1700000000000}"#,
        )
        .unwrap();
        let sample = m.into_sample();
        assert_eq!(sample.coordinate, Coordinate::new(35.0, 139.0));
        assert_eq!(sample.accuracy, Some(5.5));
        assert_eq!(sample.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_parse_fills_timestamp() {
        let before = now_ms();
        let sample = SampleMessage::parse(br#"{"latitude":1.0,"longitude":2.0}"#)
            .unwrap()
            .into_sample();
        assert!(sample.timestamp >= before);
        assert!(sample.accuracy.is_none());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            SampleMessage::parse(b"$GPGGA,123519"),
            Err(ServerError::SampleFormat(_))
        ));
    }

    #[test]
    fn test_ingest() {
        let session = session();

        let events = ingest(
            &session,
            br#"{"latitude":35.681236,"longitude":139.767125,"accuracy":5}"#,
            "test",
        )
        .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), TransitionKind::Entered);

        // Out of range and unparsable input are dropped
        assert!(ingest(&session, br#"{"latitude":135.0,"longitude":0.0}"#, "test").is_none());
        assert!(ingest(&session, b"not json", "test").is_none());
        assert_eq!(
            session.monitor.query_state("A").unwrap(),
            MembershipState::Inside
        );
    }
}
