use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use ovation_shared::events::{
    BookingConfirmedEvent, SeatEvent, SeatsClaimedEvent, SeatsReleasedEvent,
};
use ovation_shared::{Booking, BookingStatus, Ticket};

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub user_id: Uuid,
    pub concert_id: Uuid,
    pub zone_id: Uuid,
    pub seat_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub concert_id: Uuid,
    pub zone_id: Uuid,
    pub seat_ids: Vec<Uuid>,
    pub status: BookingStatus,
    pub total_cents: i64,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            booking_id: b.booking_id,
            user_id: b.user_id,
            concert_id: b.concert_id,
            zone_id: b.zone_id,
            seat_ids: b.seat_ids,
            status: b.status,
            total_cents: b.total_cents,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub ticket_id: Uuid,
    pub booking_id: Uuid,
    pub seat_id: Uuid,
    pub code: String,
    pub qr_data: String,
    pub issued_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmBookingResponse {
    pub booking: BookingResponse,
    pub tickets: Vec<TicketResponse>,
}

#[derive(Debug, Serialize)]
pub struct CancelBookingResponse {
    pub booking_id: Uuid,
    pub released_seats: Vec<Uuid>,
    pub already_cancelled: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{booking_id}", get(get_booking))
        .route("/v1/bookings/{booking_id}/confirm", post(confirm_booking))
        .route("/v1/bookings/{booking_id}/cancel", post(cancel_booking))
        .route("/v1/bookings/{booking_id}/tickets", get(booking_tickets))
        .route("/v1/users/{user_id}/bookings", get(user_bookings))
        .route("/v1/users/{user_id}/tickets", get(user_tickets))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let booking = state
        .engine
        .create_booking(req.user_id, req.concert_id, req.zone_id, req.seat_ids)
        .await?;

    let _ = state.events_tx.send(SeatEvent::SeatsClaimed(SeatsClaimedEvent {
        booking_id: booking.booking_id,
        concert_id: booking.concert_id,
        zone_id: booking.zone_id,
        seat_ids: booking.seat_ids.clone(),
        claimed_at: Utc::now().timestamp(),
    }));

    Ok((StatusCode::CREATED, Json(booking.into())))
}

async fn confirm_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ConfirmBookingResponse>, ApiError> {
    let (booking, tickets) = state.engine.confirm_booking(booking_id).await?;

    let _ = state
        .events_tx
        .send(SeatEvent::BookingConfirmed(BookingConfirmedEvent {
            booking_id: booking.booking_id,
            concert_id: booking.concert_id,
            user_id: booking.user_id,
            ticket_count: tickets.len(),
            confirmed_at: Utc::now().timestamp(),
        }));

    let tickets = tickets
        .into_iter()
        .map(|t| ticket_response(&state, t))
        .collect();

    Ok(Json(ConfirmBookingResponse {
        booking: booking.into(),
        tickets,
    }))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<CancelBookingResponse>, ApiError> {
    // Read concert/zone before the cancel for the release event
    let booking = state.engine.get_booking(booking_id).await?;
    let outcome = state.engine.cancel_booking(booking_id).await?;

    if !outcome.already_cancelled {
        let _ = state.events_tx.send(SeatEvent::SeatsReleased(SeatsReleasedEvent {
            booking_id: outcome.booking_id,
            concert_id: booking.concert_id,
            zone_id: booking.zone_id,
            seat_ids: outcome.released_seats.clone(),
            released_at: Utc::now().timestamp(),
        }));
    }

    Ok(Json(CancelBookingResponse {
        booking_id: outcome.booking_id,
        released_seats: outcome.released_seats,
        already_cancelled: outcome.already_cancelled,
    }))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.engine.get_booking(booking_id).await?;
    Ok(Json(booking.into()))
}

async fn booking_tickets(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    // 404 for unknown bookings, empty list for pending ones
    state.engine.get_booking(booking_id).await?;
    let tickets = state.engine.tickets_for_booking(booking_id).await?;
    Ok(Json(
        tickets
            .into_iter()
            .map(|t| ticket_response(&state, t))
            .collect(),
    ))
}

async fn user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = state.engine.bookings_for_user(user_id).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

async fn user_tickets(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let tickets = state.engine.tickets_for_user(user_id).await?;
    Ok(Json(
        tickets
            .into_iter()
            .map(|t| ticket_response(&state, t))
            .collect(),
    ))
}

fn ticket_response(state: &AppState, ticket: Ticket) -> TicketResponse {
    let qr_data = state.engine.qr_data(&ticket);
    TicketResponse {
        ticket_id: ticket.ticket_id,
        booking_id: ticket.booking_id,
        seat_id: ticket.seat_id,
        code: ticket.code,
        qr_data,
        issued_at: ticket.issued_at,
    }
}
