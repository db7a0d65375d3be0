use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use ovation_core::error::EngineResult;
use ovation_shared::ZoneInfo;

/// Read-side catalog collaborator. The booking engine consults it for the
/// flat per-seat zone price and for seat membership checks; it never writes
/// through this interface.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Flat per-seat price for the zone, in cents. None for unknown zones.
    async fn zone_price(&self, zone_id: Uuid) -> EngineResult<Option<i64>>;

    async fn seats_in_zone(&self, zone_id: Uuid) -> EngineResult<HashSet<Uuid>>;

    async fn seat_belongs_to(
        &self,
        seat_id: Uuid,
        concert_id: Uuid,
        zone_id: Uuid,
    ) -> EngineResult<bool>;

    async fn zones_for_concert(&self, concert_id: Uuid) -> EngineResult<Vec<ZoneInfo>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeatHome {
    concert_id: Uuid,
    zone_id: Uuid,
}

/// In-memory catalog, loaded once at startup or test setup.
pub struct StaticCatalog {
    zones: HashMap<Uuid, ZoneInfo>,
    seats: HashMap<Uuid, SeatHome>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self {
            zones: HashMap::new(),
            seats: HashMap::new(),
        }
    }

    pub fn add_zone(&mut self, zone: ZoneInfo) {
        self.zones.insert(zone.zone_id, zone);
    }

    pub fn add_seat(&mut self, seat_id: Uuid, concert_id: Uuid, zone_id: Uuid) {
        self.seats.insert(
            seat_id,
            SeatHome {
                concert_id,
                zone_id,
            },
        );
    }

    /// Registers a zone together with its full seat list.
    pub fn add_zone_with_seats(&mut self, zone: ZoneInfo, seats: &[ovation_shared::Seat]) {
        for seat in seats {
            self.add_seat(seat.seat_id, seat.concert_id, seat.zone_id);
        }
        self.add_zone(zone);
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn zone_price(&self, zone_id: Uuid) -> EngineResult<Option<i64>> {
        Ok(self.zones.get(&zone_id).map(|z| z.price_cents))
    }

    async fn seats_in_zone(&self, zone_id: Uuid) -> EngineResult<HashSet<Uuid>> {
        Ok(self
            .seats
            .iter()
            .filter(|(_, home)| home.zone_id == zone_id)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn seat_belongs_to(
        &self,
        seat_id: Uuid,
        concert_id: Uuid,
        zone_id: Uuid,
    ) -> EngineResult<bool> {
        Ok(self
            .seats
            .get(&seat_id)
            .map(|home| home.concert_id == concert_id && home.zone_id == zone_id)
            .unwrap_or(false))
    }

    async fn zones_for_concert(&self, concert_id: Uuid) -> EngineResult<Vec<ZoneInfo>> {
        let mut zones: Vec<ZoneInfo> = self
            .zones
            .values()
            .filter(|z| z.concert_id == concert_id)
            .cloned()
            .collect();
        zones.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(zones)
    }
}
