use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use ovation_shared::{SeatState, ZoneInfo};

#[derive(Debug, Serialize)]
pub struct SeatResponse {
    pub seat_id: Uuid,
    pub seat_number: String,
    pub state: SeatState,
}

#[derive(Debug, Serialize)]
pub struct ZoneSeatsResponse {
    pub concert_id: Uuid,
    pub zone_id: Uuid,
    pub seats: Vec<SeatResponse>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/concerts/{concert_id}/zones", get(concert_zones))
        .route(
            "/v1/concerts/{concert_id}/zones/{zone_id}/seats",
            get(zone_seats),
        )
        .route("/v1/concerts/{concert_id}/stream", get(concert_stream))
}

async fn concert_zones(
    State(state): State<AppState>,
    Path(concert_id): Path<Uuid>,
) -> Result<Json<Vec<ZoneInfo>>, ApiError> {
    let zones = state.catalog.zones_for_concert(concert_id).await?;
    Ok(Json(zones))
}

async fn zone_seats(
    State(state): State<AppState>,
    Path((concert_id, zone_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ZoneSeatsResponse>, ApiError> {
    let seats = state.engine.seat_states(concert_id, zone_id).await?;
    Ok(Json(ZoneSeatsResponse {
        concert_id,
        zone_id,
        seats: seats
            .into_iter()
            .map(|s| SeatResponse {
                seat_id: s.seat_id,
                seat_number: s.seat_number,
                state: s.state,
            })
            .collect(),
    }))
}

/// Live seat-event feed for one concert, so seat maps update without
/// polling.
async fn concert_stream(
    State(state): State<AppState>,
    Path(concert_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) if event.concert_id() == concert_id => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok(Event::default().event("seat_event").data(data)))
            }
            _ => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
