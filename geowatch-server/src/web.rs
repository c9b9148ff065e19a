//! REST and WebSocket API
//!
//! | Method | Path | Action |
//! |--------|------|--------|
//! | GET | `/v1/api/status` | last status line and current location |
//! | GET | `/v1/api/regions` | regions with their states |
//! | POST | `/v1/api/regions` | start monitoring a region |
//! | PUT | `/v1/api/regions/{id}` | replace a region definition |
//! | DELETE | `/v1/api/regions/{id}` | stop monitoring a region |
//! | GET | `/v1/api/regions/{id}/state` | query the state |
//! | POST | `/v1/api/regions/{id}/state` | request the state (publishes a status line) |
//! | POST | `/v1/api/samples` | feed a position sample |
//! | GET | `/v1/api/events` | WebSocket stream of monitor events |

use std::net::{Ipv4Addr, SocketAddr};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_graceful_shutdown::SubsystemHandle;

use geowatch_core::{GeofenceError, MembershipState, Region, RegionStatus, Sample, TransitionEvent};

use crate::error::ServerError;
use crate::sink::MonitorEvent;
use crate::source::SampleMessage;
use crate::Session;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_location: Option<Sample>,
    pub regions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub id: String,
    pub state: MembershipState,
}

/// Core errors mapped onto HTTP status codes
pub struct ApiError(GeofenceError);

impl From<GeofenceError> for ApiError {
    fn from(e: GeofenceError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            GeofenceError::DuplicateId(_) => StatusCode::CONFLICT,
            GeofenceError::NotFound(_) => StatusCode::NOT_FOUND,
            GeofenceError::InvalidSample(_)
            | GeofenceError::InvalidRegion { .. }
            | GeofenceError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.0.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}

pub fn router(session: Session) -> Router {
    Router::new()
        .route("/v1/api/status", get(get_status))
        .route("/v1/api/regions", get(get_regions).post(post_region))
        .route("/v1/api/regions/{id}", put(put_region).delete(delete_region))
        .route(
            "/v1/api/regions/{id}/state",
            get(get_state).post(post_request_state),
        )
        .route("/v1/api/samples", post(post_sample))
        .route("/v1/api/events", get(events_ws))
        .with_state(session)
}

pub struct WebServer {
    session: Session,
}

impl WebServer {
    pub fn new(session: Session) -> Self {
        WebServer { session }
    }

    pub async fn run(self, subsys: SubsystemHandle) -> Result<(), ServerError> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.session.args.port));
        let listener = TcpListener::bind(addr).await?;
        log::info!("HTTP API listening on http://{}/v1/api/", addr);

        axum::serve(listener, router(self.session))
            .with_graceful_shutdown(async move { subsys.on_shutdown_requested().await })
            .await?;
        Ok(())
    }
}

fn region_status(session: &Session, id: &str) -> Result<RegionStatus, ApiError> {
    session
        .monitor
        .snapshot()
        .into_iter()
        .find(|r| r.region.id == id)
        .ok_or_else(|| ApiError(GeofenceError::NotFound(id.to_string())))
}

async fn get_status(State(session): State<Session>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: session.monitor.status(),
        current_location: session.monitor.current_location(),
        regions: session.monitor.list().len(),
    })
}

async fn get_regions(State(session): State<Session>) -> Json<Vec<RegionStatus>> {
    Json(session.monitor.snapshot())
}

async fn post_region(
    State(session): State<Session>,
    Json(region): Json<Region>,
) -> Result<(StatusCode, Json<RegionStatus>), ApiError> {
    let id = region.id.clone();
    if !session.monitor.start_monitoring(region)? {
        return Err(ApiError(GeofenceError::DuplicateId(id)));
    }
    Ok((StatusCode::CREATED, Json(region_status(&session, &id)?)))
}

async fn put_region(
    State(session): State<Session>,
    Path(id): Path<String>,
    Json(region): Json<Region>,
) -> Result<Json<RegionStatus>, ApiError> {
    if region.id != id {
        return Err(ApiError(GeofenceError::InvalidRegion {
            id,
            reason: format!("body id '{}' does not match path", region.id),
        }));
    }
    session.monitor.update(region)?;
    Ok(Json(region_status(&session, &id)?))
}

async fn delete_region(
    State(session): State<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    session.monitor.stop_monitoring(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_state(
    State(session): State<Session>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    let state = session.monitor.query_state(&id)?;
    Ok(Json(StateResponse { id, state }))
}

async fn post_request_state(
    State(session): State<Session>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    let state = session.monitor.request_state(&id)?;
    Ok(Json(StateResponse { id, state }))
}

async fn post_sample(
    State(session): State<Session>,
    body: Result<Json<SampleMessage>, JsonRejection>,
) -> Result<Json<Vec<TransitionEvent>>, ApiError> {
    // A body that does not parse as a sample is as invalid as one out of range
    let Json(message) = body.map_err(|e| GeofenceError::InvalidSample(e.body_text()))?;
    let events = session.monitor.on_sample(message.into_sample())?;
    Ok(Json(events))
}

async fn events_ws(State(session): State<Session>, ws: WebSocketUpgrade) -> Response {
    // Subscribe before the upgrade so nothing published during the handshake
    // is missed
    let rx = session.monitor.sink().subscribe();
    ws.on_upgrade(move |socket| stream_events(socket, rx))
}

async fn stream_events(mut socket: WebSocket, mut rx: broadcast::Receiver<MonitorEvent>) {
    log::debug!("WebSocket client connected");
    loop {
        tokio::select! {
            r = rx.recv() => {
                match r {
                    Ok(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                log::error!("Cannot encode {:?}: {}", event, e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("WebSocket client skipped {} monitor events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            },
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Clients have nothing to say; pings are answered by axum
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    log::debug!("WebSocket client disconnected");
}
