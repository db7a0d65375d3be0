use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Proof of a confirmed seat claim. Exactly one exists per seat of a
/// confirmed booking, never before confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: Uuid,
    pub booking_id: Uuid,
    pub seat_id: Uuid,
    /// Human-presentable code, unique across all tickets ever issued
    pub code: String,
    pub issued_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(booking_id: Uuid, seat_id: Uuid, code: String) -> Self {
        Self {
            ticket_id: Uuid::new_v4(),
            booking_id,
            seat_id,
            code,
            issued_at: Utc::now(),
        }
    }
}
