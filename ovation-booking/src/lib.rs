pub mod engine;
pub mod ledger;
pub mod memory;
pub mod seats;

pub use engine::{BookingEngine, EngineLimits};
pub use memory::MemoryStore;
pub use seats::SeatMap;
