pub mod catalog;
pub mod seatmap;

pub use catalog::{Catalog, StaticCatalog};
pub use seatmap::build_zone_seats;
