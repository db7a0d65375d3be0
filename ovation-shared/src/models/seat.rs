use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seat availability state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    Available,
    Held,
}

impl std::fmt::Display for SeatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeatState::Available => write!(f, "AVAILABLE"),
            SeatState::Held => write!(f, "HELD"),
        }
    }
}

/// A single reservable unit, tied to one zone of one concert for its lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub seat_id: Uuid,
    pub concert_id: Uuid,
    pub zone_id: Uuid,
    pub seat_number: String,
    pub state: SeatState,
}

impl Seat {
    pub fn new(concert_id: Uuid, zone_id: Uuid, seat_number: impl Into<String>) -> Self {
        Self {
            seat_id: Uuid::new_v4(),
            concert_id,
            zone_id,
            seat_number: seat_number.into(),
            state: SeatState::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == SeatState::Available
    }
}
