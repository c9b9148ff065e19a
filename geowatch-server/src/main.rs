use std::time::Duration;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle, Toplevel};

use geowatch_server::config::GeofenceConfig;
use geowatch_server::sink::forward_output;
use geowatch_server::source::{ReplaySource, UdpSampleReceiver};
use geowatch_server::web::WebServer;
use geowatch_server::{Cli, Session, SessionInner};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(1000);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let config = GeofenceConfig::resolve(args.config.as_deref()).into_diagnostic()?;
    let session = SessionInner::new(args, config).into_diagnostic()?;

    log::info!("geowatch-server {} starting", env!("CARGO_PKG_VERSION"));

    Toplevel::new(move |s: SubsystemHandle| async move {
        start_subsystems(session, &s);
    })
    .catch_signals()
    .handle_shutdown_requests(SHUTDOWN_TIMEOUT)
    .await
    .into_diagnostic()
}

fn start_subsystems(session: Session, subsys: &SubsystemHandle) {
    if session.args.output {
        let session = session.clone();
        subsys.start(SubsystemBuilder::new("stdout", move |s| {
            forward_output(session, s)
        }));
    }

    if let Some(port) = session.args.udp_port {
        let receiver = UdpSampleReceiver::new(session.clone(), port);
        subsys.start(SubsystemBuilder::new("udp samples", move |s| {
            receiver.run(s)
        }));
    }

    if let Some(path) = session.args.replay.clone() {
        let interval = Duration::from_millis(session.args.replay_interval);
        let replay = ReplaySource::new(session.clone(), path, interval);
        subsys.start(SubsystemBuilder::new("replay", move |s| replay.run(s)));
    }

    let web = WebServer::new(session);
    subsys.start(SubsystemBuilder::new("web", move |s| web.run(s)));
}
