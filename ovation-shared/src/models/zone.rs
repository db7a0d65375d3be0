use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pricing partition of a concert's seats. Read-only from the booking
/// engine's perspective; only the flat per-seat price is consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub zone_id: Uuid,
    pub concert_id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub capacity: u32,
}

impl ZoneInfo {
    pub fn new(concert_id: Uuid, name: impl Into<String>, price_cents: i64, capacity: u32) -> Self {
        Self {
            zone_id: Uuid::new_v4(),
            concert_id,
            name: name.into(),
            price_cents,
            capacity,
        }
    }
}
