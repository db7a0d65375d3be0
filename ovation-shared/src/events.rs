use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatsClaimedEvent {
    pub booking_id: Uuid,
    pub concert_id: Uuid,
    pub zone_id: Uuid,
    pub seat_ids: Vec<Uuid>,
    pub claimed_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatsReleasedEvent {
    pub booking_id: Uuid,
    pub concert_id: Uuid,
    pub zone_id: Uuid,
    pub seat_ids: Vec<Uuid>,
    pub released_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub concert_id: Uuid,
    pub user_id: Uuid,
    pub ticket_count: usize,
    pub confirmed_at: i64,
}

/// Envelope fanned out to seat-map subscribers over the broadcast channel
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatEvent {
    SeatsClaimed(SeatsClaimedEvent),
    SeatsReleased(SeatsReleasedEvent),
    BookingConfirmed(BookingConfirmedEvent),
}

impl SeatEvent {
    /// Concert the event belongs to, used for per-concert stream filtering
    pub fn concert_id(&self) -> Uuid {
        match self {
            SeatEvent::SeatsClaimed(e) => e.concert_id,
            SeatEvent::SeatsReleased(e) => e.concert_id,
            SeatEvent::BookingConfirmed(e) => e.concert_id,
        }
    }
}
