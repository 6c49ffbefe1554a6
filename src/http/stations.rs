//! Station capacity endpoints (spec §5 "Shared resources", §4.4.4): reserve
//! on task assignment, release on stage completion/failure. Retries the
//! CAS once on a concurrent-modification conflict, since the only thing that
//! could have changed underneath is another caller's own increment/decrement.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use tracing::warn;

use super::errors::{ok, ApiError};
use super::AppState;
use crate::domain::ids::StationId;
use crate::domain::station::Station;
use crate::execution_plan::station_store::StationRepositoryError;
use crate::outbox::OutboxEvent;

/// Append a station-capacity event. Best-effort, mirroring
/// `http::routes::append_event`: the CAS above already committed, so a
/// failed append is logged rather than surfaced to the caller.
async fn append_event(state: &AppState, station: &Station, event_type: &str, data: serde_json::Value) {
    let event = OutboxEvent::new(event_type.to_string(), station.station_id.to_string(), station.station_id.to_string(), data);
    if let Err(e) = state.outbox.append(event).await {
        warn!(error = %e, station_id = %station.station_id, event_type, "station event append failed");
    }
}

pub fn mutating_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/stations/:station_id/capacity/reserve", post(reserve))
        .route("/api/v1/stations/:station_id/capacity/release", post(release))
}

async fn reserve(State(state): State<AppState>, Path(station_id): Path<StationId>) -> Result<Response, ApiError> {
    for _ in 0..2 {
        let mut station = state.stations.get(station_id).await?;
        let expected_version = station.version;
        station.increment_tasks()?;
        match state.stations.compare_and_swap(&station, expected_version).await {
            Ok(()) => {
                append_event(
                    &state,
                    &station,
                    "station.capacity-reserved",
                    serde_json::json!({ "currentTasks": station.current_tasks, "maxConcurrentTasks": station.max_concurrent_tasks }),
                )
                .await;
                return Ok(ok(station));
            }
            Err(StationRepositoryError::Conflict(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(ApiError::from(StationRepositoryError::Conflict(station_id)))
}

async fn release(State(state): State<AppState>, Path(station_id): Path<StationId>) -> Result<Response, ApiError> {
    for _ in 0..2 {
        let mut station = state.stations.get(station_id).await?;
        let expected_version = station.version;
        station.decrement_tasks();
        match state.stations.compare_and_swap(&station, expected_version).await {
            Ok(()) => {
                append_event(
                    &state,
                    &station,
                    "station.capacity-released",
                    serde_json::json!({ "currentTasks": station.current_tasks, "maxConcurrentTasks": station.max_concurrent_tasks }),
                )
                .await;
                return Ok(ok(station));
            }
            Err(StationRepositoryError::Conflict(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(ApiError::from(StationRepositoryError::Conflict(station_id)))
}
