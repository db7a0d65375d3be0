use std::sync::Arc;
use tokio::sync::broadcast;

use ovation_booking::BookingEngine;
use ovation_catalog::Catalog;
use ovation_shared::events::SeatEvent;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
    pub catalog: Arc<dyn Catalog>,
    pub events_tx: broadcast::Sender<SeatEvent>,
}
