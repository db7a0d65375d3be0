use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, warn};
use uuid::Uuid;

use ovation_core::error::{EngineError, EngineResult};
use ovation_core::repository::{CancelOutcome, ReservationStore};
use ovation_shared::{Booking, BookingStatus, Seat, SeatState, Ticket};

/// Transaction attempts before a serialization conflict surfaces as
/// `StorageUnavailable`.
const TX_RETRY_ATTEMPTS: u32 = 3;

/// Postgres-backed reservation store. Each mutating operation runs in one
/// transaction; contested seat rows are locked with `FOR UPDATE` in
/// `seat_id` order so concurrent claims serialize without deadlocking. The
/// partial unique index on `booking_seats(seat_id) WHERE NOT released` is
/// the schema-level backstop for seat exclusivity.
pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    booking_id: Uuid,
    user_id: Uuid,
    concert_id: Uuid,
    zone_id: Uuid,
    status: String,
    total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    seat_id: Uuid,
    concert_id: Uuid,
    zone_id: Uuid,
    seat_number: String,
    state: String,
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    ticket_id: Uuid,
    booking_id: Uuid,
    seat_id: Uuid,
    code: String,
    issued_at: DateTime<Utc>,
}

/// Failures inside a transaction body: engine-level outcomes pass through,
/// database errors feed the retry loop.
enum TxError {
    Engine(EngineError),
    Db(sqlx::Error),
}

impl From<sqlx::Error> for TxError {
    fn from(err: sqlx::Error) -> Self {
        TxError::Db(err)
    }
}

impl From<EngineError> for TxError {
    fn from(err: EngineError) -> Self {
        TxError::Engine(err)
    }
}

fn is_retryable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn storage_err(err: sqlx::Error) -> EngineError {
    error!("reservation store error: {}", err);
    EngineError::StorageUnavailable(err.to_string())
}

fn parse_seat_state(raw: &str) -> Result<SeatState, EngineError> {
    match raw {
        "AVAILABLE" => Ok(SeatState::Available),
        "HELD" => Ok(SeatState::Held),
        other => Err(EngineError::StorageUnavailable(format!(
            "unexpected seat state {other:?}"
        ))),
    }
}

fn parse_booking_status(raw: &str) -> Result<BookingStatus, EngineError> {
    match raw {
        "PENDING" => Ok(BookingStatus::Pending),
        "CONFIRMED" => Ok(BookingStatus::Confirmed),
        "CANCELLED" => Ok(BookingStatus::Cancelled),
        other => Err(EngineError::StorageUnavailable(format!(
            "unexpected booking status {other:?}"
        ))),
    }
}

impl TryFrom<SeatRow> for Seat {
    type Error = EngineError;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        Ok(Seat {
            seat_id: row.seat_id,
            concert_id: row.concert_id,
            zone_id: row.zone_id,
            seat_number: row.seat_number,
            state: parse_seat_state(&row.state)?,
        })
    }
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Ticket {
            ticket_id: row.ticket_id,
            booking_id: row.booking_id,
            seat_id: row.seat_id,
            code: row.code,
            issued_at: row.issued_at,
        }
    }
}

impl PgReservationStore {
    fn booking_from_row(row: BookingRow, seat_ids: Vec<Uuid>) -> Result<Booking, EngineError> {
        Ok(Booking {
            booking_id: row.booking_id,
            user_id: row.user_id,
            concert_id: row.concert_id,
            zone_id: row.zone_id,
            seat_ids,
            status: parse_booking_status(&row.status)?,
            total_cents: row.total_cents,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn seat_ids_of(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT seat_id FROM booking_seats WHERE booking_id = $1 ORDER BY position",
        )
        .bind(booking_id)
        .fetch_all(&mut **tx)
        .await
    }

    async fn lock_booking(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> Result<BookingRow, TxError> {
        sqlx::query_as::<_, BookingRow>(
            "SELECT booking_id, user_id, concert_id, zone_id, status, total_cents, created_at, updated_at \
             FROM bookings WHERE booking_id = $1 FOR UPDATE",
        )
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(TxError::Engine(EngineError::BookingNotFound(booking_id)))
    }

    async fn try_create(&self, booking: &Booking) -> Result<(), TxError> {
        let mut tx = self.pool.begin().await?;

        // Lock the contested rows in seat_id order
        let mut requested = booking.seat_ids.clone();
        requested.sort();
        let rows = sqlx::query_as::<_, SeatRow>(
            "SELECT seat_id, concert_id, zone_id, seat_number, state \
             FROM seats WHERE seat_id = ANY($1) ORDER BY seat_id FOR UPDATE",
        )
        .bind(&requested)
        .fetch_all(&mut *tx)
        .await?;

        if rows.len() != requested.len() {
            let found: Vec<Uuid> = rows.iter().map(|r| r.seat_id).collect();
            let missing = requested
                .iter()
                .find(|id| !found.contains(id))
                .copied()
                .unwrap_or(booking.seat_ids[0]);
            return Err(TxError::Engine(EngineError::UnknownSeat(missing)));
        }

        let mut conflicting: Vec<Uuid> = rows
            .iter()
            .filter(|r| r.state != "AVAILABLE")
            .map(|r| r.seat_id)
            .collect();
        if !conflicting.is_empty() {
            conflicting.sort();
            return Err(TxError::Engine(EngineError::SeatsUnavailable {
                conflicting,
            }));
        }

        sqlx::query("UPDATE seats SET state = 'HELD' WHERE seat_id = ANY($1)")
            .bind(&requested)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO bookings (booking_id, user_id, concert_id, zone_id, status, total_cents, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(booking.booking_id)
        .bind(booking.user_id)
        .bind(booking.concert_id)
        .bind(booking.zone_id)
        .bind(booking.status.to_string())
        .bind(booking.total_cents)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, seat_id) in booking.seat_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO booking_seats (booking_id, seat_id, position, released) \
                 VALUES ($1, $2, $3, FALSE)",
            )
            .bind(booking.booking_id)
            .bind(seat_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn try_confirm(&self, booking_id: Uuid, tickets: &[Ticket]) -> Result<Booking, TxError> {
        let mut tx = self.pool.begin().await?;

        let row = Self::lock_booking(&mut tx, booking_id).await?;
        let status = parse_booking_status(&row.status)?;
        if status != BookingStatus::Pending {
            return Err(TxError::Engine(EngineError::InvalidTransition {
                from: status,
                to: BookingStatus::Confirmed,
            }));
        }

        let updated = sqlx::query_as::<_, BookingRow>(
            "UPDATE bookings SET status = 'CONFIRMED', updated_at = NOW() WHERE booking_id = $1 \
             RETURNING booking_id, user_id, concert_id, zone_id, status, total_cents, created_at, updated_at",
        )
        .bind(booking_id)
        .fetch_one(&mut *tx)
        .await?;

        for ticket in tickets {
            sqlx::query(
                "INSERT INTO tickets (ticket_id, booking_id, seat_id, code, issued_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(ticket.ticket_id)
            .bind(ticket.booking_id)
            .bind(ticket.seat_id)
            .bind(&ticket.code)
            .bind(ticket.issued_at)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    TxError::Engine(EngineError::DuplicateTicket { booking_id })
                } else {
                    TxError::Db(err)
                }
            })?;
        }

        let seat_ids = Self::seat_ids_of(&mut tx, booking_id).await?;
        tx.commit().await?;

        Ok(Self::booking_from_row(updated, seat_ids)?)
    }

    async fn try_cancel(&self, booking_id: Uuid) -> Result<CancelOutcome, TxError> {
        let mut tx = self.pool.begin().await?;

        let row = Self::lock_booking(&mut tx, booking_id).await?;
        match parse_booking_status(&row.status)? {
            BookingStatus::Cancelled => Ok(CancelOutcome {
                booking_id,
                released_seats: Vec::new(),
                already_cancelled: true,
            }),
            BookingStatus::Confirmed => Err(TxError::Engine(EngineError::InvalidTransition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Cancelled,
            })),
            BookingStatus::Pending => {
                let held: Vec<Uuid> = sqlx::query_scalar::<_, Uuid>(
                    "SELECT seat_id FROM booking_seats \
                     WHERE booking_id = $1 AND NOT released ORDER BY seat_id",
                )
                .bind(booking_id)
                .fetch_all(&mut *tx)
                .await?;

                sqlx::query("UPDATE seats SET state = 'AVAILABLE' WHERE seat_id = ANY($1)")
                    .bind(&held)
                    .execute(&mut *tx)
                    .await?;

                sqlx::query("UPDATE booking_seats SET released = TRUE WHERE booking_id = $1")
                    .bind(booking_id)
                    .execute(&mut *tx)
                    .await?;

                sqlx::query(
                    "UPDATE bookings SET status = 'CANCELLED', updated_at = NOW() \
                     WHERE booking_id = $1",
                )
                .bind(booking_id)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
                Ok(CancelOutcome {
                    booking_id,
                    released_seats: held,
                    already_cancelled: false,
                })
            }
        }
    }
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn create_booking(&self, booking: &Booking) -> EngineResult<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_create(booking).await {
                Ok(()) => return Ok(()),
                Err(TxError::Engine(err)) => return Err(err),
                Err(TxError::Db(err)) if is_retryable(&err) && attempt < TX_RETRY_ATTEMPTS => {
                    warn!(attempt, "claim transaction serialization conflict, retrying");
                }
                Err(TxError::Db(err)) => return Err(storage_err(err)),
            }
        }
    }

    async fn confirm_booking(
        &self,
        booking_id: Uuid,
        tickets: &[Ticket],
    ) -> EngineResult<Booking> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_confirm(booking_id, tickets).await {
                Ok(booking) => return Ok(booking),
                Err(TxError::Engine(err)) => return Err(err),
                Err(TxError::Db(err)) if is_retryable(&err) && attempt < TX_RETRY_ATTEMPTS => {
                    warn!(attempt, "confirm transaction serialization conflict, retrying");
                }
                Err(TxError::Db(err)) => return Err(storage_err(err)),
            }
        }
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> EngineResult<CancelOutcome> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_cancel(booking_id).await {
                Ok(outcome) => return Ok(outcome),
                Err(TxError::Engine(err)) => return Err(err),
                Err(TxError::Db(err)) if is_retryable(&err) && attempt < TX_RETRY_ATTEMPTS => {
                    warn!(attempt, "cancel transaction serialization conflict, retrying");
                }
                Err(TxError::Db(err)) => return Err(storage_err(err)),
            }
        }
    }

    async fn get_booking(&self, booking_id: Uuid) -> EngineResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT booking_id, user_id, concert_id, zone_id, status, total_cents, created_at, updated_at \
             FROM bookings WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        match row {
            None => Ok(None),
            Some(row) => {
                let seat_ids = sqlx::query_scalar::<_, Uuid>(
                    "SELECT seat_id FROM booking_seats WHERE booking_id = $1 ORDER BY position",
                )
                .bind(booking_id)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_err)?;
                Ok(Some(Self::booking_from_row(row, seat_ids)?))
            }
        }
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> EngineResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT booking_id, user_id, concert_id, zone_id, status, total_cents, created_at, updated_at \
             FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in rows {
            let seat_ids = sqlx::query_scalar::<_, Uuid>(
                "SELECT seat_id FROM booking_seats WHERE booking_id = $1 ORDER BY position",
            )
            .bind(row.booking_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;
            bookings.push(Self::booking_from_row(row, seat_ids)?);
        }
        Ok(bookings)
    }

    async fn tickets_for_booking(&self, booking_id: Uuid) -> EngineResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            "SELECT ticket_id, booking_id, seat_id, code, issued_at \
             FROM tickets WHERE booking_id = $1 ORDER BY issued_at, ticket_id",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows.into_iter().map(Ticket::from).collect())
    }

    async fn seat_state(&self, seat_id: Uuid) -> EngineResult<Option<SeatState>> {
        let raw = sqlx::query_scalar::<_, String>("SELECT state FROM seats WHERE seat_id = $1")
            .bind(seat_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        raw.map(|s| parse_seat_state(&s)).transpose()
    }

    async fn seat_states(&self, concert_id: Uuid, zone_id: Uuid) -> EngineResult<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(
            "SELECT seat_id, concert_id, zone_id, seat_number, state \
             FROM seats WHERE concert_id = $1 AND zone_id = $2 ORDER BY seat_number",
        )
        .bind(concert_id)
        .bind(zone_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter().map(Seat::try_from).collect()
    }

    async fn insert_seats(&self, seats: &[Seat]) -> EngineResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        for seat in seats {
            sqlx::query(
                "INSERT INTO seats (seat_id, concert_id, zone_id, seat_number, state) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(seat.seat_id)
            .bind(seat.concert_id)
            .bind(seat.zone_id)
            .bind(&seat.seat_number)
            .bind(seat.state.to_string())
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        }
        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }
}
