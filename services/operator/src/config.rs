//! Configuration for the operator.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use dronefleet_platform::DEFAULT_DATASTORE_SECRET;
use dronefleet_reconcile::{
    HealthOutcomeSource, JobTemplate, DEFAULT_MAX_CONCURRENT_RECONCILES,
    DEFAULT_RECONCILE_INTERVAL,
};

use crate::worker::WorkerConfig;

/// Operator configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace holding missions, jobs and the datastore secret.
    pub namespace: String,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Interval between reconcile passes.
    pub reconcile_interval: Duration,

    /// Missions reconciled concurrently within one pass.
    pub max_concurrent_reconciles: usize,

    /// Worker image holding the mission executables.
    pub worker_image: String,

    /// Secret holding datastore connection parameters.
    pub datastore_secret: String,

    /// Source of health-check verdicts.
    pub health_outcome: HealthOutcomeSource,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let namespace = lookup("DRONEFLEET_NAMESPACE").unwrap_or_else(|| "default".to_string());

        let log_level = lookup("DRONEFLEET_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let reconcile_interval = match lookup("DRONEFLEET_RECONCILE_INTERVAL_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse()
                    .with_context(|| format!("invalid DRONEFLEET_RECONCILE_INTERVAL_MS: {ms}"))?,
            ),
            None => DEFAULT_RECONCILE_INTERVAL,
        };
        if reconcile_interval.is_zero() {
            bail!("DRONEFLEET_RECONCILE_INTERVAL_MS must be greater than zero");
        }

        let max_concurrent_reconciles = match lookup("DRONEFLEET_MAX_CONCURRENT_RECONCILES") {
            Some(n) => n
                .parse()
                .with_context(|| format!("invalid DRONEFLEET_MAX_CONCURRENT_RECONCILES: {n}"))?,
            None => DEFAULT_MAX_CONCURRENT_RECONCILES,
        };

        let worker_image =
            lookup("DRONEFLEET_WORKER_IMAGE").unwrap_or_else(|| JobTemplate::default().image);

        let datastore_secret = lookup("DRONEFLEET_DATASTORE_SECRET")
            .unwrap_or_else(|| DEFAULT_DATASTORE_SECRET.to_string());

        let health_outcome = match lookup("DRONEFLEET_HEALTH_OUTCOME").as_deref() {
            None | Some("observed") => HealthOutcomeSource::Observed,
            Some("simulated") => HealthOutcomeSource::Simulated,
            Some(other) => bail!("invalid DRONEFLEET_HEALTH_OUTCOME: {other} (expected observed or simulated)"),
        };

        Ok(Self {
            namespace,
            log_level,
            reconcile_interval,
            max_concurrent_reconciles,
            worker_image,
            datastore_secret,
            health_outcome,
        })
    }

    /// Job template using the configured worker image.
    pub fn job_template(&self) -> JobTemplate {
        JobTemplate {
            image: self.worker_image.clone(),
            ..JobTemplate::default()
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            interval: self.reconcile_interval,
            max_concurrent: self.max_concurrent_reconciles,
        }
    }
}
