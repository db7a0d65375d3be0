use std::net::SocketAddr;
use std::sync::Arc;

use ovation_api::{app, AppState};
use ovation_booking::{BookingEngine, EngineLimits};
use ovation_core::StaticIdentity;
use ovation_store::{DbClient, PgCatalog, PgReservationStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ovation_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ovation_store::app_config::Config::load()?;
    tracing::info!("Starting Ovation API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url).await?;
    db.migrate().await?;

    let store = Arc::new(PgReservationStore::new(db.pool.clone()));
    let catalog = Arc::new(PgCatalog::new(db.pool.clone()));

    // Authentication lives in front of this service; every authenticated
    // caller is a valid user from the engine's point of view.
    let identity = Arc::new(StaticIdentity::allow_all());

    let limits = EngineLimits {
        max_seats_per_booking: config.business_rules.max_seats_per_booking,
        code_retry_attempts: config.business_rules.code_retry_attempts,
    };
    let engine = Arc::new(BookingEngine::new(
        store,
        catalog.clone(),
        identity,
        limits,
    ));

    let (events_tx, _) = tokio::sync::broadcast::channel(100);

    let app_state = AppState {
        engine,
        catalog,
        events_tx,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state)).await?;
    Ok(())
}
