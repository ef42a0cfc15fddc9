//! dronefleet operator
//!
//! Drives every drone mission through its lifecycle:
//! health check, data collection, verdict, cleanup.
//!
//! ## Architecture
//!
//! - **Mission Worker**: Lists missions on a fixed interval and fans out
//!   reconcile steps with bounded concurrency
//! - **Mission Controller**: Runs one reconcile step for one mission
//! - **Platform**: Kubernetes custom resources, batch Jobs and the datastore
//!   secret

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dronefleet_operator::config::Config;
use dronefleet_operator::controller::MissionController;
use dronefleet_operator::worker::MissionWorker;
use dronefleet_platform::{KubePlatform, Platform};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting dronefleet operator");
    info!(
        namespace = %config.namespace,
        worker_image = %config.worker_image,
        datastore_secret = %config.datastore_secret,
        health_outcome = ?config.health_outcome,
        "Configuration loaded"
    );

    let kube = KubePlatform::connect(&config.namespace, &config.datastore_secret)
        .await
        .context("failed to connect to the Kubernetes API")?;
    info!(namespace = %kube.namespace(), "Connected to Kubernetes API");
    let platform: Arc<dyn Platform> = Arc::new(kube);

    let controller = MissionController::new(
        Arc::clone(&platform),
        config.job_template(),
        config.health_outcome,
    );
    let worker = MissionWorker::new(platform, controller, config.worker_config());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut worker_handle = tokio::spawn(async move {
        worker.run(shutdown_rx).await;
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = &mut worker_handle => {
            if let Err(e) = result {
                error!(error = %e, "Mission worker panicked");
            }
            return Ok(());
        }
    }

    let _ = shutdown_tx.send(true);

    info!("Waiting for mission worker to finish its pass...");
    if tokio::time::timeout(Duration::from_secs(10), worker_handle)
        .await
        .is_err()
    {
        error!("Mission worker did not stop in time");
    }

    info!("Operator shutdown complete");
    Ok(())
}
