use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use ovation_catalog::Catalog;
use ovation_core::error::{EngineError, EngineResult};
use ovation_core::identity::IdentityService;
use ovation_core::repository::{CancelOutcome, ReservationStore};
use ovation_shared::{Booking, BookingStatus, Seat, Ticket};
use ovation_ticket::TicketIssuer;

/// Operational limits, sourced from configuration by the API layer.
#[derive(Debug, Clone)]
pub struct EngineLimits {
    pub max_seats_per_booking: u32,
    /// Confirmation retries when a generated ticket code collides.
    pub code_retry_attempts: u32,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_seats_per_booking: 8,
            code_retry_attempts: 3,
        }
    }
}

/// Orchestrates seat allocation, booking state transitions and ticket
/// issuance. Exclusivity and atomicity are delegated to the
/// `ReservationStore`; the engine validates requests, computes prices and
/// drives the Pending -> Confirmed | Cancelled state machine.
pub struct BookingEngine {
    store: Arc<dyn ReservationStore>,
    catalog: Arc<dyn Catalog>,
    identity: Arc<dyn IdentityService>,
    issuer: TicketIssuer,
    limits: EngineLimits,
}

impl BookingEngine {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        catalog: Arc<dyn Catalog>,
        identity: Arc<dyn IdentityService>,
        limits: EngineLimits,
    ) -> Self {
        Self {
            store,
            catalog,
            identity,
            issuer: TicketIssuer::new(),
            limits,
        }
    }

    /// Claims the requested seats and records a Pending booking, as one
    /// atomic unit. Exactly one concurrent caller wins each contested seat;
    /// losers receive `SeatsUnavailable` naming the conflicts and may retry
    /// with different seats.
    pub async fn create_booking(
        &self,
        user_id: Uuid,
        concert_id: Uuid,
        zone_id: Uuid,
        seat_ids: Vec<Uuid>,
    ) -> EngineResult<Booking> {
        if seat_ids.is_empty() {
            return Err(EngineError::Validation(
                "a booking needs at least one seat".into(),
            ));
        }
        if seat_ids.len() > self.limits.max_seats_per_booking as usize {
            return Err(EngineError::Validation(format!(
                "at most {} seats per booking",
                self.limits.max_seats_per_booking
            )));
        }
        let distinct: HashSet<Uuid> = seat_ids.iter().copied().collect();
        if distinct.len() != seat_ids.len() {
            return Err(EngineError::Validation(
                "duplicate seat in request".into(),
            ));
        }

        if !self.identity.user_exists(user_id).await? {
            return Err(EngineError::Validation(format!("unknown user {}", user_id)));
        }

        let price_cents = self
            .catalog
            .zone_price(zone_id)
            .await?
            .ok_or_else(|| EngineError::Validation(format!("unknown zone {}", zone_id)))?;

        for seat_id in &seat_ids {
            if !self
                .catalog
                .seat_belongs_to(*seat_id, concert_id, zone_id)
                .await?
            {
                return Err(EngineError::Validation(format!(
                    "seat {} does not belong to zone {} of concert {}",
                    seat_id, zone_id, concert_id
                )));
            }
        }

        let total_cents = price_cents * seat_ids.len() as i64;
        let booking = Booking::new(user_id, concert_id, zone_id, seat_ids, total_cents);

        self.store.create_booking(&booking).await?;

        info!(
            booking_id = %booking.booking_id,
            seats = booking.seat_ids.len(),
            total_cents,
            "booking created"
        );
        Ok(booking)
    }

    /// Transitions a Pending booking to Confirmed and issues exactly one
    /// ticket per seat, atomically with the status flip. A ticket code
    /// collision is retried with fresh codes a bounded number of times.
    pub async fn confirm_booking(&self, booking_id: Uuid) -> EngineResult<(Booking, Vec<Ticket>)> {
        let attempts = self.limits.code_retry_attempts.max(1);

        for attempt in 1..=attempts {
            let booking = self
                .store
                .get_booking(booking_id)
                .await?
                .ok_or(EngineError::BookingNotFound(booking_id))?;

            // Advisory early check; the store re-validates inside the
            // atomic unit, which is what decides a confirm/cancel race.
            if booking.status != BookingStatus::Pending {
                return Err(EngineError::InvalidTransition {
                    from: booking.status,
                    to: BookingStatus::Confirmed,
                });
            }

            let tickets = self.issuer.issue_all(&booking);
            match self.store.confirm_booking(booking_id, &tickets).await {
                Ok(confirmed) => {
                    info!(
                        booking_id = %booking_id,
                        tickets = tickets.len(),
                        "booking confirmed"
                    );
                    return Ok((confirmed, tickets));
                }
                Err(EngineError::DuplicateTicket { .. }) if attempt < attempts => {
                    warn!(
                        booking_id = %booking_id,
                        attempt,
                        "ticket code collision, reissuing"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(EngineError::DuplicateTicket { booking_id })
    }

    /// Releases the booking's seats and marks it Cancelled, atomically.
    /// Repeat cancellation is a no-op success; Confirmed is terminal, so
    /// cancelling a confirmed booking fails with `InvalidTransition`.
    pub async fn cancel_booking(&self, booking_id: Uuid) -> EngineResult<CancelOutcome> {
        let outcome = self.store.cancel_booking(booking_id).await?;
        if !outcome.already_cancelled {
            info!(
                booking_id = %booking_id,
                released = outcome.released_seats.len(),
                "booking cancelled"
            );
        }
        Ok(outcome)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> EngineResult<Booking> {
        self.store
            .get_booking(booking_id)
            .await?
            .ok_or(EngineError::BookingNotFound(booking_id))
    }

    pub async fn bookings_for_user(&self, user_id: Uuid) -> EngineResult<Vec<Booking>> {
        self.store.bookings_for_user(user_id).await
    }

    pub async fn tickets_for_booking(&self, booking_id: Uuid) -> EngineResult<Vec<Ticket>> {
        self.store.tickets_for_booking(booking_id).await
    }

    /// Tickets across the user's confirmed bookings, the gate-scan view.
    pub async fn tickets_for_user(&self, user_id: Uuid) -> EngineResult<Vec<Ticket>> {
        let mut tickets = Vec::new();
        for booking in self.store.bookings_for_user(user_id).await? {
            if booking.status == BookingStatus::Confirmed {
                tickets.extend(self.store.tickets_for_booking(booking.booking_id).await?);
            }
        }
        Ok(tickets)
    }

    /// Availability view of one zone's seats.
    pub async fn seat_states(&self, concert_id: Uuid, zone_id: Uuid) -> EngineResult<Vec<Seat>> {
        self.store.seat_states(concert_id, zone_id).await
    }

    pub fn qr_data(&self, ticket: &Ticket) -> String {
        self.issuer.qr_data(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use ovation_catalog::{build_zone_seats, StaticCatalog};
    use ovation_core::identity::StaticIdentity;
    use ovation_shared::ZoneInfo;

    struct Fixture {
        engine: BookingEngine,
        concert_id: Uuid,
        zone_id: Uuid,
        seat_ids: Vec<Uuid>,
        user_id: Uuid,
    }

    async fn fixture(capacity: u32, price_cents: i64) -> Fixture {
        let concert_id = Uuid::new_v4();
        let zone = ZoneInfo::new(concert_id, "Arena", price_cents, capacity);
        let zone_id = zone.zone_id;
        let seats = build_zone_seats(&zone, 10);
        let seat_ids: Vec<Uuid> = seats.iter().map(|s| s.seat_id).collect();

        let mut catalog = StaticCatalog::new();
        catalog.add_zone_with_seats(zone, &seats);

        let store = Arc::new(MemoryStore::new());
        store.insert_seats(&seats).await.unwrap();

        let user_id = Uuid::new_v4();
        let engine = BookingEngine::new(
            store,
            Arc::new(catalog),
            Arc::new(StaticIdentity::new([user_id])),
            EngineLimits::default(),
        );

        Fixture {
            engine,
            concert_id,
            zone_id,
            seat_ids,
            user_id,
        }
    }

    #[tokio::test]
    async fn test_create_booking_claims_and_prices() {
        let fx = fixture(10, 150_00).await;

        let booking = fx
            .engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                fx.zone_id,
                fx.seat_ids[..3].to_vec(),
            )
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_cents, 450_00);
        assert_eq!(booking.seat_ids, fx.seat_ids[..3].to_vec());

        let seats = fx.engine.seat_states(fx.concert_id, fx.zone_id).await.unwrap();
        let held = seats.iter().filter(|s| !s.is_available()).count();
        assert_eq!(held, 3);
    }

    #[tokio::test]
    async fn test_overlap_names_only_contested_seats() {
        let fx = fixture(10, 100_00).await;

        fx.engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                fx.zone_id,
                fx.seat_ids[..2].to_vec(),
            )
            .await
            .unwrap();

        let err = fx
            .engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                fx.zone_id,
                fx.seat_ids[1..4].to_vec(),
            )
            .await
            .unwrap_err();

        match err {
            EngineError::SeatsUnavailable { conflicting } => {
                assert_eq!(conflicting, vec![fx.seat_ids[1]]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The loser's free seats were not claimed
        let seats = fx.engine.seat_states(fx.concert_id, fx.zone_id).await.unwrap();
        let held = seats.iter().filter(|s| !s.is_available()).count();
        assert_eq!(held, 2);
    }

    #[tokio::test]
    async fn test_validation_failures() {
        let fx = fixture(10, 100_00).await;

        let empty = fx
            .engine
            .create_booking(fx.user_id, fx.concert_id, fx.zone_id, vec![])
            .await
            .unwrap_err();
        assert!(matches!(empty, EngineError::Validation(_)));

        let duplicated = fx
            .engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                fx.zone_id,
                vec![fx.seat_ids[0], fx.seat_ids[0]],
            )
            .await
            .unwrap_err();
        assert!(matches!(duplicated, EngineError::Validation(_)));

        let too_many = fx
            .engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                fx.zone_id,
                fx.seat_ids[..9].to_vec(),
            )
            .await
            .unwrap_err();
        assert!(matches!(too_many, EngineError::Validation(_)));

        let stranger = fx
            .engine
            .create_booking(
                Uuid::new_v4(),
                fx.concert_id,
                fx.zone_id,
                fx.seat_ids[..1].to_vec(),
            )
            .await
            .unwrap_err();
        assert!(matches!(stranger, EngineError::Validation(_)));

        let wrong_zone = fx
            .engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                Uuid::new_v4(),
                fx.seat_ids[..1].to_vec(),
            )
            .await
            .unwrap_err();
        assert!(matches!(wrong_zone, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_confirm_issues_one_ticket_per_seat() {
        let fx = fixture(10, 100_00).await;

        let booking = fx
            .engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                fx.zone_id,
                fx.seat_ids[..4].to_vec(),
            )
            .await
            .unwrap();

        let (confirmed, tickets) = fx.engine.confirm_booking(booking.booking_id).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(tickets.len(), 4);

        let codes: HashSet<&str> = tickets.iter().map(|t| t.code.as_str()).collect();
        assert_eq!(codes.len(), 4);
        let seats: HashSet<Uuid> = tickets.iter().map(|t| t.seat_id).collect();
        assert_eq!(seats, booking.seat_ids.iter().copied().collect());
    }

    #[tokio::test]
    async fn test_confirm_twice_rejected_without_new_tickets() {
        let fx = fixture(10, 100_00).await;

        let booking = fx
            .engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                fx.zone_id,
                fx.seat_ids[..2].to_vec(),
            )
            .await
            .unwrap();

        fx.engine.confirm_booking(booking.booking_id).await.unwrap();
        let err = fx.engine.confirm_booking(booking.booking_id).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition {
                from: BookingStatus::Confirmed,
                ..
            }
        ));

        let tickets = fx.engine.tickets_for_booking(booking.booking_id).await.unwrap();
        assert_eq!(tickets.len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_releases_for_rebooking() {
        let fx = fixture(10, 100_00).await;
        let seats = fx.seat_ids[..3].to_vec();

        let booking = fx
            .engine
            .create_booking(fx.user_id, fx.concert_id, fx.zone_id, seats.clone())
            .await
            .unwrap();

        let outcome = fx.engine.cancel_booking(booking.booking_id).await.unwrap();
        assert_eq!(outcome.released_seats, seats);

        // Same seats are claimable again immediately
        let rebooked = fx
            .engine
            .create_booking(fx.user_id, fx.concert_id, fx.zone_id, seats)
            .await
            .unwrap();
        assert_eq!(rebooked.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_confirmed_is_terminal() {
        let fx = fixture(10, 100_00).await;

        let booking = fx
            .engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                fx.zone_id,
                fx.seat_ids[..2].to_vec(),
            )
            .await
            .unwrap();
        fx.engine.confirm_booking(booking.booking_id).await.unwrap();

        let err = fx.engine.cancel_booking(booking.booking_id).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Cancelled,
            }
        ));

        // Seats of a confirmed booking stay held
        let seats = fx.engine.seat_states(fx.concert_id, fx.zone_id).await.unwrap();
        assert_eq!(seats.iter().filter(|s| !s.is_available()).count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_booking_operations() {
        let fx = fixture(4, 100_00).await;
        let ghost = Uuid::new_v4();

        assert!(matches!(
            fx.engine.confirm_booking(ghost).await.unwrap_err(),
            EngineError::BookingNotFound(_)
        ));
        assert!(matches!(
            fx.engine.cancel_booking(ghost).await.unwrap_err(),
            EngineError::BookingNotFound(_)
        ));
        assert!(matches!(
            fx.engine.get_booking(ghost).await.unwrap_err(),
            EngineError::BookingNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_tickets_for_user_skips_unconfirmed() {
        let fx = fixture(10, 100_00).await;

        let confirmed = fx
            .engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                fx.zone_id,
                fx.seat_ids[..2].to_vec(),
            )
            .await
            .unwrap();
        fx.engine.confirm_booking(confirmed.booking_id).await.unwrap();

        fx.engine
            .create_booking(
                fx.user_id,
                fx.concert_id,
                fx.zone_id,
                fx.seat_ids[2..4].to_vec(),
            )
            .await
            .unwrap();

        let tickets = fx.engine.tickets_for_user(fx.user_id).await.unwrap();
        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|t| t.booking_id == confirmed.booking_id));
    }
}
