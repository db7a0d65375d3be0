use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use ovation_catalog::Catalog;
use ovation_core::error::{EngineError, EngineResult};
use ovation_shared::ZoneInfo;

/// Read-side catalog backed by the zones and seats tables.
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ZoneRow {
    zone_id: Uuid,
    concert_id: Uuid,
    name: String,
    price_cents: i64,
    capacity: i32,
}

impl From<ZoneRow> for ZoneInfo {
    fn from(row: ZoneRow) -> Self {
        ZoneInfo {
            zone_id: row.zone_id,
            concert_id: row.concert_id,
            name: row.name,
            price_cents: row.price_cents,
            capacity: row.capacity.max(0) as u32,
        }
    }
}

fn storage_err(err: sqlx::Error) -> EngineError {
    tracing::error!("catalog store error: {}", err);
    EngineError::StorageUnavailable(err.to_string())
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn zone_price(&self, zone_id: Uuid) -> EngineResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT price_cents FROM zones WHERE zone_id = $1")
            .bind(zone_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)
    }

    async fn seats_in_zone(&self, zone_id: Uuid) -> EngineResult<HashSet<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT seat_id FROM seats WHERE zone_id = $1")
            .bind(zone_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(ids.into_iter().collect())
    }

    async fn seat_belongs_to(
        &self,
        seat_id: Uuid,
        concert_id: Uuid,
        zone_id: Uuid,
    ) -> EngineResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM seats \
             WHERE seat_id = $1 AND concert_id = $2 AND zone_id = $3)",
        )
        .bind(seat_id)
        .bind(concert_id)
        .bind(zone_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)
    }

    async fn zones_for_concert(&self, concert_id: Uuid) -> EngineResult<Vec<ZoneInfo>> {
        let rows = sqlx::query_as::<_, ZoneRow>(
            "SELECT zone_id, concert_id, name, price_cents, capacity \
             FROM zones WHERE concert_id = $1 ORDER BY name",
        )
        .bind(concert_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows.into_iter().map(ZoneInfo::from).collect())
    }
}
