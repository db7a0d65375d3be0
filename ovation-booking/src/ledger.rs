use std::collections::HashMap;
use uuid::Uuid;

use ovation_shared::{Booking, BookingStatus};

/// In-memory reservation ledger: booking id -> {seats, status, timestamps}.
/// Mutations are plain `&mut self`; atomicity with the seat store comes
/// from the single lock `MemoryStore` holds over both.
pub struct Ledger {
    bookings: HashMap<Uuid, Booking>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            bookings: HashMap::new(),
        }
    }

    /// Returns false (and stores nothing) when the id is already present.
    pub fn insert(&mut self, booking: Booking) -> bool {
        match self.bookings.entry(booking.booking_id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(booking);
                true
            }
        }
    }

    pub fn get(&self, booking_id: Uuid) -> Option<&Booking> {
        self.bookings.get(&booking_id)
    }

    /// Updates the status and `updated_at`; returns the updated entry.
    pub fn set_status(&mut self, booking_id: Uuid, status: BookingStatus) -> Option<&Booking> {
        let booking = self.bookings.get_mut(&booking_id)?;
        booking.update_status(status);
        Some(booking)
    }

    pub fn bookings_for_user(&self, user_id: Uuid) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bookings
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut ledger = Ledger::new();
        let booking = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![Uuid::new_v4()],
            50_00,
        );
        let id = booking.booking_id;

        assert!(ledger.insert(booking.clone()));
        assert!(!ledger.insert(booking));
        assert_eq!(ledger.get(id).unwrap().status, BookingStatus::Pending);
    }

    #[test]
    fn test_set_status_touches_updated_at() {
        let mut ledger = Ledger::new();
        let booking = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![Uuid::new_v4()],
            50_00,
        );
        let id = booking.booking_id;
        let created_at = booking.created_at;
        ledger.insert(booking);

        let updated = ledger.set_status(id, BookingStatus::Confirmed).unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);
        assert!(updated.updated_at >= created_at);

        assert!(ledger.set_status(Uuid::new_v4(), BookingStatus::Cancelled).is_none());
    }

    #[test]
    fn test_bookings_for_user_newest_first() {
        let mut ledger = Ledger::new();
        let user_id = Uuid::new_v4();
        for _ in 0..3 {
            ledger.insert(Booking::new(
                user_id,
                Uuid::new_v4(),
                Uuid::new_v4(),
                vec![Uuid::new_v4()],
                10_00,
            ));
        }
        ledger.insert(Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![Uuid::new_v4()],
            10_00,
        ));

        let mine = ledger.bookings_for_user(user_id);
        assert_eq!(mine.len(), 3);
        assert!(mine.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }
}
