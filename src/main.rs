//! Satellite tracker server

use std::sync::Arc;

use sat_tracker::{
    config::AppConfig,
    database::Database,
    errors::SatTrackerError,
    position::PositionClient,
    routes::{self, AppState},
};
use tokio::{net::TcpListener, signal};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), SatTrackerError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    #[cfg(feature = "dotenvy")]
    dotenvy::dotenv().ok();

    // Built-in defaults, then config/local, then SATTRACKER__* variables
    let config = AppConfig::load()?;
    config.validate()?;

    let database = Database::from_config(&config.database).await?;

    // The list route repeats this check on every call
    let satellites = database.seed_if_empty(&config.seed.satellites).await?;
    info!("{} active satellites in store", satellites.len());

    let state = AppState {
        database,
        position_client: PositionClient::from_config(&config.tracking)?,
        tracked: config.tracking.satellite.clone(),
        seed: Arc::new(config.seed.satellites.clone()),
    };
    let app = routes::app(state, &config.server.base_path);

    let listener = TcpListener::bind(config.server.listen).await?;
    info!(
        "Listening on {} under {}",
        listener.local_addr()?,
        config.server.base_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
