use ovation_shared::BookingStatus;
use uuid::Uuid;

/// Failure taxonomy for every engine operation. All variants are reported
/// synchronously to the caller; none are retried automatically except
/// transient store failures, which are retried internally a bounded number
/// of times before surfacing as `StorageUnavailable`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// One or more requested seats were not Available. Names the exact
    /// conflicting seats so the caller can retry with different ones.
    #[error("seats unavailable: {conflicting:?}")]
    SeatsUnavailable { conflicting: Vec<Uuid> },

    #[error("unknown seat: {0}")]
    UnknownSeat(Uuid),

    #[error("booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// A ticket already exists for this booking's seat, or the generated
    /// code collided with one issued earlier.
    #[error("duplicate ticket for booking {booking_id}")]
    DuplicateTicket { booking_id: Uuid },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
