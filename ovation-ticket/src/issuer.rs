use uuid::Uuid;

use crate::code::generate_code;
use ovation_shared::{Booking, Ticket};

/// Produces tickets for confirmed bookings: exactly one per reserved seat,
/// each with a fresh unique code. The issuer itself is stateless; the
/// reservation store's uniqueness constraints are the authoritative guard
/// against duplicates.
#[derive(Debug, Clone, Default)]
pub struct TicketIssuer;

impl TicketIssuer {
    pub fn new() -> Self {
        Self
    }

    pub fn issue(&self, booking_id: Uuid, seat_id: Uuid) -> Ticket {
        Ticket::new(booking_id, seat_id, generate_code())
    }

    /// One ticket per seat, in the booking's seat order.
    pub fn issue_all(&self, booking: &Booking) -> Vec<Ticket> {
        booking
            .seat_ids
            .iter()
            .map(|seat_id| self.issue(booking.booking_id, *seat_id))
            .collect()
    }

    /// JSON payload encoded into the scannable code on the ticket face.
    pub fn qr_data(&self, ticket: &Ticket) -> String {
        serde_json::json!({
            "code": ticket.code,
            "booking_id": ticket.booking_id,
            "seat_id": ticket.seat_id,
            "issued_at": ticket.issued_at,
        })
        .to_string()
    }
}
