//! Geowatch Server
//!
//! Hosts a [`GeofenceMonitor`] and connects it to the outside world:
//!
//! - samples arrive as JSON over UDP, from a replay file, or via HTTP POST
//! - transitions and status lines fan out over a broadcast channel to the
//!   WebSocket API and (optionally) stdout
//! - regions are loaded from a JSON config file and managed over REST

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

use geowatch_core::GeofenceMonitor;

pub mod config;
pub mod error;
pub mod sink;
pub mod source;
pub mod web;

use config::GeofenceConfig;
use error::ServerError;
use sink::BroadcastSink;

/// Default port for the HTTP API
pub const DEFAULT_HTTP_PORT: u16 = 6510;

/// Depth of the monitor event channel; slow subscribers lag beyond this
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// JSON file with the monitor settings and regions to monitor
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port for the HTTP API
    #[arg(short, long, default_value_t = DEFAULT_HTTP_PORT)]
    pub port: u16,

    /// Listen for JSON position samples on this UDP port
    #[arg(long)]
    pub udp_port: Option<u16>,

    /// Replay JSON-lines position samples from a file
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Delay between replayed samples in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub replay_interval: u64,

    /// Write monitor events to stdout as JSON lines
    #[arg(long, default_value_t = false)]
    pub output: bool,
}

pub type Monitor = GeofenceMonitor<BroadcastSink>;

pub type Session = Arc<SessionInner>;

pub struct SessionInner {
    pub args: Cli,
    pub monitor: Monitor,
}

impl SessionInner {
    /// Build the monitor and start monitoring every configured region
    pub fn new(args: Cli, config: GeofenceConfig) -> Result<Session, ServerError> {
        let monitor = GeofenceMonitor::new(
            config.monitor,
            BroadcastSink::new(EVENT_CHANNEL_CAPACITY),
        )?;

        for region in config.regions {
            let id = region.id.clone();
            if !monitor.start_monitoring(region)? {
                log::warn!("{}: listed more than once in config, ignoring duplicate", id);
            }
        }

        Ok(Arc::new(SessionInner { args, monitor }))
    }
}
