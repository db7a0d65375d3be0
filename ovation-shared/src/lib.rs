pub mod events;
pub mod models;

pub use models::booking::{Booking, BookingStatus};
pub use models::seat::{Seat, SeatState};
pub use models::ticket::Ticket;
pub use models::zone::ZoneInfo;
