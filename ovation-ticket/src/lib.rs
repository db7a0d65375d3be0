pub mod code;
pub mod issuer;

pub use code::{generate_code, verify_code};
pub use issuer::TicketIssuer;
