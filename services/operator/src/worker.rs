//! Mission worker.
//!
//! Runs the reconcile loop on a periodic interval. Each pass lists missions,
//! delivers a creation event the first time this process sees a mission and a
//! tick afterwards, and reconciles missions concurrently. Passes never
//! overlap, so a mission is never reconciled twice at once by one worker.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dronefleet_mission::Mission;
use dronefleet_platform::Platform;
use dronefleet_reconcile::{EventKind, DEFAULT_MAX_CONCURRENT_RECONCILES, DEFAULT_RECONCILE_INTERVAL};
use futures_util::stream::{self, StreamExt};
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::controller::{MissionController, Outcome};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Interval between passes.
    pub interval: Duration,

    /// Missions reconciled concurrently within one pass.
    pub max_concurrent: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RECONCILE_INTERVAL,
            max_concurrent: DEFAULT_MAX_CONCURRENT_RECONCILES,
        }
    }
}

/// Statistics from a single pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassStats {
    pub list_failed: bool,
    pub missions_seen: usize,
    pub created_events: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl PassStats {
    fn changed(&self) -> bool {
        self.created_events > 0 || self.updated > 0 || self.deleted > 0 || self.failed > 0
    }
}

/// Worker driving the mission controller.
pub struct MissionWorker {
    platform: Arc<dyn Platform>,
    controller: MissionController,
    config: WorkerConfig,

    /// Missions this process has delivered a creation event for.
    seen: Mutex<HashSet<String>>,
}

impl MissionWorker {
    /// Create a new mission worker.
    pub fn new(platform: Arc<dyn Platform>, controller: MissionController, config: WorkerConfig) -> Self {
        Self {
            platform,
            controller,
            config,
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Run the worker until shutdown is signaled.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            max_concurrent = self.config.max_concurrent,
            "Starting mission worker"
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let stats = self.run_pass().await;
                    if stats.changed() {
                        info!(
                            missions = stats.missions_seen,
                            created = stats.created_events,
                            updated = stats.updated,
                            deleted = stats.deleted,
                            failed = stats.failed,
                            "Reconcile pass complete"
                        );
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Mission worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Run a single reconcile pass over every mission.
    pub async fn run_pass(&self) -> PassStats {
        let mut stats = PassStats::default();

        let missions = match self.platform.list_missions().await {
            Ok(missions) => missions,
            Err(e) => {
                warn!(error = %e, "Failed to list missions, nothing learned this tick");
                stats.list_failed = true;
                return stats;
            }
        };
        stats.missions_seen = missions.len();

        let events = self.classify(missions).await;
        stats.created_events = events
            .iter()
            .filter(|(event, _)| *event == EventKind::Created)
            .count();

        let controller = &self.controller;
        let results: Vec<_> = stream::iter(events)
            .map(|(event, mission)| async move {
                let result = controller.reconcile(event, &mission).await;
                (mission.name, result)
            })
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let mut gone = Vec::new();
        for (name, result) in results {
            match result {
                Ok(Outcome::Updated(_)) => stats.updated += 1,
                Ok(Outcome::Deleted | Outcome::Absent) => {
                    stats.deleted += 1;
                    gone.push(name);
                }
                Ok(Outcome::Ignored | Outcome::Waiting) => {}
                Err(e) => {
                    debug!(mission = %name, error = %e, "Reconcile step failed, will retry");
                    stats.failed += 1;
                }
            }
        }

        if !gone.is_empty() {
            let mut seen = self.seen.lock().await;
            for name in &gone {
                seen.remove(name);
            }
        }

        stats
    }

    /// Pair each mission with the event to deliver, releasing state held for
    /// missions that are no longer listed.
    async fn classify(&self, missions: Vec<Mission>) -> Vec<(EventKind, Mission)> {
        let mut seen = self.seen.lock().await;
        let listed: HashSet<&str> = missions.iter().map(|m| m.name.as_str()).collect();
        seen.retain(|name| listed.contains(name.as_str()));

        missions
            .into_iter()
            .map(|mission| {
                let event = if seen.insert(mission.name.clone()) {
                    EventKind::Created
                } else {
                    EventKind::Tick
                };
                (event, mission)
            })
            .collect()
    }

    /// Number of missions currently tracked.
    pub async fn tracked_missions(&self) -> usize {
        self.seen.lock().await.len()
    }
}
