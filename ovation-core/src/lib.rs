pub mod error;
pub mod identity;
pub mod repository;

pub use error::{EngineError, EngineResult};
pub use identity::{IdentityService, StaticIdentity};
pub use repository::{CancelOutcome, ReservationStore};
