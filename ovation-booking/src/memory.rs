use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::ledger::Ledger;
use crate::seats::{SeatError, SeatMap};
use ovation_core::error::{EngineError, EngineResult};
use ovation_core::repository::{CancelOutcome, ReservationStore};
use ovation_shared::{Booking, BookingStatus, Seat, SeatState, Ticket};

struct Inner {
    seats: SeatMap,
    ledger: Ledger,
    tickets: HashMap<Uuid, Vec<Ticket>>,
    issued_codes: HashSet<String>,
}

/// In-process `ReservationStore`. One mutex spans the seat map, the ledger
/// and the ticket vault, so each operation is a single atomic unit: no
/// reader ever sees seats held without a matching non-cancelled booking.
/// The lock is never held across an await point.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                seats: SeatMap::new(),
                ledger: Ledger::new(),
                tickets: HashMap::new(),
                issued_codes: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| EngineError::StorageUnavailable("seat store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl From<SeatError> for EngineError {
    fn from(err: SeatError) -> Self {
        match err {
            SeatError::Unavailable { conflicting } => EngineError::SeatsUnavailable { conflicting },
            SeatError::Unknown(id) => EngineError::UnknownSeat(id),
        }
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn create_booking(&self, booking: &Booking) -> EngineResult<()> {
        let mut inner = self.lock()?;

        if inner.ledger.get(booking.booking_id).is_some() {
            return Err(EngineError::Validation(format!(
                "booking id {} already exists",
                booking.booking_id
            )));
        }

        inner.seats.try_claim(&booking.seat_ids)?;
        inner.ledger.insert(booking.clone());
        Ok(())
    }

    async fn confirm_booking(
        &self,
        booking_id: Uuid,
        tickets: &[Ticket],
    ) -> EngineResult<Booking> {
        let mut inner = self.lock()?;

        let status = inner
            .ledger
            .get(booking_id)
            .map(|b| b.status)
            .ok_or(EngineError::BookingNotFound(booking_id))?;

        if status != BookingStatus::Pending {
            return Err(EngineError::InvalidTransition {
                from: status,
                to: BookingStatus::Confirmed,
            });
        }

        let pair_taken = tickets.iter().any(|t| {
            inner
                .tickets
                .get(&booking_id)
                .map(|issued| issued.iter().any(|i| i.seat_id == t.seat_id))
                .unwrap_or(false)
        });
        let code_taken = tickets.iter().any(|t| inner.issued_codes.contains(&t.code));
        if pair_taken || code_taken {
            return Err(EngineError::DuplicateTicket { booking_id });
        }

        for ticket in tickets {
            inner.issued_codes.insert(ticket.code.clone());
        }
        inner
            .tickets
            .entry(booking_id)
            .or_default()
            .extend(tickets.iter().cloned());

        let confirmed = inner
            .ledger
            .set_status(booking_id, BookingStatus::Confirmed)
            .cloned()
            .ok_or(EngineError::BookingNotFound(booking_id))?;
        Ok(confirmed)
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> EngineResult<CancelOutcome> {
        let mut inner = self.lock()?;

        let booking = inner
            .ledger
            .get(booking_id)
            .cloned()
            .ok_or(EngineError::BookingNotFound(booking_id))?;

        match booking.status {
            BookingStatus::Cancelled => Ok(CancelOutcome {
                booking_id,
                released_seats: Vec::new(),
                already_cancelled: true,
            }),
            BookingStatus::Confirmed => Err(EngineError::InvalidTransition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Cancelled,
            }),
            BookingStatus::Pending => {
                inner.seats.release(&booking.seat_ids);
                inner.ledger.set_status(booking_id, BookingStatus::Cancelled);
                Ok(CancelOutcome {
                    booking_id,
                    released_seats: booking.seat_ids,
                    already_cancelled: false,
                })
            }
        }
    }

    async fn get_booking(&self, booking_id: Uuid) -> EngineResult<Option<Booking>> {
        Ok(self.lock()?.ledger.get(booking_id).cloned())
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> EngineResult<Vec<Booking>> {
        Ok(self.lock()?.ledger.bookings_for_user(user_id))
    }

    async fn tickets_for_booking(&self, booking_id: Uuid) -> EngineResult<Vec<Ticket>> {
        Ok(self
            .lock()?
            .tickets
            .get(&booking_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn seat_state(&self, seat_id: Uuid) -> EngineResult<Option<SeatState>> {
        Ok(self.lock()?.seats.status_of(seat_id))
    }

    async fn seat_states(&self, concert_id: Uuid, zone_id: Uuid) -> EngineResult<Vec<Seat>> {
        Ok(self.lock()?.seats.seats_in(concert_id, zone_id))
    }

    async fn insert_seats(&self, seats: &[Seat]) -> EngineResult<()> {
        self.lock()?.seats.insert_all(seats.iter().cloned());
        Ok(())
    }
}
