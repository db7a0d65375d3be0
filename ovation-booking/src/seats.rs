use std::collections::HashMap;
use uuid::Uuid;

use ovation_shared::{Seat, SeatState};

#[derive(Debug, thiserror::Error)]
pub enum SeatError {
    #[error("seats unavailable: {conflicting:?}")]
    Unavailable { conflicting: Vec<Uuid> },

    #[error("unknown seat: {0}")]
    Unknown(Uuid),
}

/// In-memory seat store: the record of every seat's identity and current
/// availability. Claims are all-or-nothing; callers needing atomicity with
/// the ledger compose both behind one lock (see `MemoryStore`).
pub struct SeatMap {
    seats: HashMap<Uuid, Seat>,
}

impl SeatMap {
    pub fn new() -> Self {
        Self {
            seats: HashMap::new(),
        }
    }

    pub fn insert(&mut self, seat: Seat) {
        self.seats.insert(seat.seat_id, seat);
    }

    pub fn insert_all(&mut self, seats: impl IntoIterator<Item = Seat>) {
        for seat in seats {
            self.insert(seat);
        }
    }

    /// Transitions every seat in the set Available -> Held if and only if
    /// all of them are currently Available; otherwise claims none and
    /// reports the unavailable seats (sorted, so failures are
    /// deterministic). Unknown ids also claim nothing.
    pub fn try_claim(&mut self, seat_ids: &[Uuid]) -> Result<(), SeatError> {
        for id in seat_ids {
            if !self.seats.contains_key(id) {
                return Err(SeatError::Unknown(*id));
            }
        }

        let mut conflicting: Vec<Uuid> = seat_ids
            .iter()
            .filter(|id| {
                self.seats
                    .get(id)
                    .map(|s| !s.is_available())
                    .unwrap_or(false)
            })
            .copied()
            .collect();

        if !conflicting.is_empty() {
            conflicting.sort();
            conflicting.dedup();
            return Err(SeatError::Unavailable { conflicting });
        }

        for id in seat_ids {
            if let Some(seat) = self.seats.get_mut(id) {
                seat.state = SeatState::Held;
            }
        }
        Ok(())
    }

    /// Transitions the given seats Held -> Available. Idempotent: releasing
    /// an already-available or unknown seat is a no-op, not an error.
    pub fn release(&mut self, seat_ids: &[Uuid]) {
        for id in seat_ids {
            if let Some(seat) = self.seats.get_mut(id) {
                seat.state = SeatState::Available;
            }
        }
    }

    pub fn status_of(&self, seat_id: Uuid) -> Option<SeatState> {
        self.seats.get(&seat_id).map(|s| s.state)
    }

    pub fn seats_in(&self, concert_id: Uuid, zone_id: Uuid) -> Vec<Seat> {
        let mut seats: Vec<Seat> = self
            .seats
            .values()
            .filter(|s| s.concert_id == concert_id && s.zone_id == zone_id)
            .cloned()
            .collect();
        seats.sort_by(|a, b| a.seat_number.cmp(&b.seat_number));
        seats
    }
}

impl Default for SeatMap {
    fn default() -> Self {
        Self::new()
    }
}
