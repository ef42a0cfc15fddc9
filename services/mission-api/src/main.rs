//! dronefleet mission API
//!
//! Reports the status of every registered drone and accepts new missions.
//! Missions are written to the resource store; the operator takes it from
//! there.

use std::sync::Arc;

use anyhow::{Context, Result};
use dronefleet_mission_api::{api, config, state::AppState};
use dronefleet_platform::{KubePlatform, DEFAULT_DATASTORE_SECRET};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting dronefleet mission API");
    info!(
        listen_addr = %config.listen_addr,
        namespace = %config.namespace,
        drones = ?config.drones.ids(),
        "Configuration loaded"
    );

    let platform = KubePlatform::connect(&config.namespace, DEFAULT_DATASTORE_SECRET)
        .await
        .context("failed to connect to the Kubernetes API")?;
    info!(namespace = %platform.namespace(), "Connected to Kubernetes API");

    let state = AppState::new(Arc::new(platform), config.drones.clone());
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Received shutdown signal");
        })
        .await;

    match result {
        Ok(()) => info!("Mission API shutdown complete"),
        Err(e) => error!(error = %e, "Server error"),
    }
    Ok(())
}
