use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::EngineResult;
use ovation_shared::{Booking, Seat, SeatState, Ticket};

/// Result of a cancellation. `released_seats` is empty when the booking was
/// already cancelled (the repeat call is a no-op success).
#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub booking_id: Uuid,
    pub released_seats: Vec<Uuid>,
    pub already_cancelled: bool,
}

/// Durable home of seat state and the reservation ledger.
///
/// Every mutating method is one atomic unit: the seat-state change and its
/// ledger change are never observable independently. Implementations either
/// run both against the same database transaction or hold one in-process
/// lock across both, so concurrent callers racing for overlapping seats see
/// exactly one winner.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Atomically claims every seat of `booking` (all-or-nothing) and
    /// records the Pending ledger entry. Fails with `SeatsUnavailable`
    /// naming the conflicting seats, or `UnknownSeat`, claiming nothing.
    async fn create_booking(&self, booking: &Booking) -> EngineResult<()>;

    /// Atomically transitions Pending -> Confirmed and persists the given
    /// tickets. Re-checks the status inside the atomic unit: a lost race
    /// against cancel (or a repeat confirm) fails with `InvalidTransition`
    /// and persists no tickets. A ticket code collision fails with
    /// `DuplicateTicket`, leaving the booking Pending for a retry.
    async fn confirm_booking(&self, booking_id: Uuid, tickets: &[Ticket])
        -> EngineResult<Booking>;

    /// Atomically releases the booking's seats and marks it Cancelled.
    /// Repeat cancellation is a no-op success; cancelling a Confirmed
    /// booking fails with `InvalidTransition`.
    async fn cancel_booking(&self, booking_id: Uuid) -> EngineResult<CancelOutcome>;

    async fn get_booking(&self, booking_id: Uuid) -> EngineResult<Option<Booking>>;

    async fn bookings_for_user(&self, user_id: Uuid) -> EngineResult<Vec<Booking>>;

    async fn tickets_for_booking(&self, booking_id: Uuid) -> EngineResult<Vec<Ticket>>;

    /// Point-in-time read of a single seat's state.
    async fn seat_state(&self, seat_id: Uuid) -> EngineResult<Option<SeatState>>;

    /// Seat-map view for one zone of one concert.
    async fn seat_states(&self, concert_id: Uuid, zone_id: Uuid) -> EngineResult<Vec<Seat>>;

    /// Venue setup: registers seats, all starting Available.
    async fn insert_seats(&self, seats: &[Seat]) -> EngineResult<()>;
}
