//! Mission controller.
//!
//! Executes one reconcile step for one mission:
//! - Dispatches on (event kind, phase) to a handler
//! - Observes job state through the platform
//! - Applies the resulting plan: jobs, then a single status patch, then deletion
//!
//! A failed read means nothing was learned this tick and no write is
//! attempted. A failed job creation aborts the step before the status write so
//! the same step runs again on the next tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dronefleet_mission::{HealthCheckResult, JobRole, Mission, Phase};
use dronefleet_platform::{Platform, PlatformError};
use dronefleet_reconcile::{
    assess_health_check, collector_roles, dispatch, plan_finalize, plan_health_failed,
    plan_health_passed, plan_mission_jobs, plan_recreate_health_check,
    plan_record_health_result, plan_start, EventKind, Handler, HealthAssessment,
    HealthOutcomeSource, JobTally, JobTemplate, JobsOutcome, Plan, ReconcileError,
};
use tracing::{debug, info, instrument, warn};

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors that end a reconcile step early.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),
}

/// What a reconcile step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The mission is not in the store.
    Absent,

    /// The event needs no handling in the mission's phase.
    Ignored,

    /// Nothing new was observed, or only jobs were resubmitted.
    Waiting,

    /// The status was written; carries the phase after the write.
    Updated(Phase),

    /// The mission is gone.
    Deleted,
}

/// Reconciles individual missions.
pub struct MissionController {
    platform: Arc<dyn Platform>,
    template: JobTemplate,
    health_outcome: HealthOutcomeSource,
}

impl MissionController {
    /// Create a new controller.
    pub fn new(
        platform: Arc<dyn Platform>,
        template: JobTemplate,
        health_outcome: HealthOutcomeSource,
    ) -> Self {
        Self {
            platform,
            template,
            health_outcome,
        }
    }

    /// Reconcile a mission by name, reading it from the store first.
    pub async fn reconcile_named(&self, event: EventKind, name: &str) -> ControllerResult<Outcome> {
        match self.platform.get_mission(name).await? {
            Some(mission) => self.reconcile(event, &mission).await,
            None => {
                debug!(mission = %name, "Mission not found, nothing to do");
                Ok(Outcome::Absent)
            }
        }
    }

    /// Reconcile a mission as last observed.
    #[instrument(
        skip(self, mission),
        fields(mission = %mission.name, drone_id = %mission.spec.drone_id, phase = %mission.phase())
    )]
    pub async fn reconcile(&self, event: EventKind, mission: &Mission) -> ControllerResult<Outcome> {
        let now = Utc::now();

        let plan = match dispatch(event, mission.phase()) {
            Handler::Start => {
                info!("New mission, starting health check");
                plan_start(mission, &self.template, now)?
            }
            Handler::AwaitHealthCheck => self.await_health_check(mission, now).await?,
            Handler::AwaitMissionJobs => self.await_mission_jobs(mission, now).await?,
            Handler::Finalize => {
                info!("Mission ended, cleaning up");
                plan_finalize(mission, now)?
            }
            Handler::Ignore => {
                debug!(?event, "Nothing to handle");
                return Ok(Outcome::Ignored);
            }
        };

        self.execute(mission, plan).await
    }

    async fn await_health_check(
        &self,
        mission: &Mission,
        now: DateTime<Utc>,
    ) -> ControllerResult<Plan> {
        // Always the deterministic name, whatever the status recorded.
        let job = JobRole::HealthCheck.job_name(&mission.name);
        let observed = self.platform.job_state(&job).await?;

        let assessment =
            assess_health_check(&mission.status, observed, self.health_outcome, roll_health_check);

        let plan = match assessment {
            HealthAssessment::Waiting => {
                debug!(job = %job, "Health check still running");
                Plan::wait()
            }
            HealthAssessment::Missing => {
                warn!(job = %job, "Health-check job missing, resubmitting");
                plan_recreate_health_check(mission, &self.template)
            }
            HealthAssessment::Record(result) => {
                info!(?result, "Simulated health-check verdict rolled");
                plan_record_health_result(mission, result)
            }
            HealthAssessment::Decided(result) if result.passed() => {
                let datastore = if collector_roles(&mission.spec).is_empty() {
                    None
                } else {
                    Some(self.platform.datastore_credentials().await?)
                };
                info!("Health check passed");
                plan_health_passed(mission, datastore.as_ref(), &self.template, now)?
            }
            HealthAssessment::Decided(_) => {
                warn!("Health check failed, drone is malfunctioning");
                plan_health_failed(mission, now)?
            }
        };
        Ok(plan)
    }

    async fn await_mission_jobs(
        &self,
        mission: &Mission,
        now: DateTime<Utc>,
    ) -> ControllerResult<Plan> {
        let jobs = mission.status.associated_jobs();
        let mut tally = JobTally::new(jobs.len());

        for job in &jobs {
            let state = self.platform.job_state(job).await?;
            if state.is_none() {
                debug!(job = %job, "Job no longer exists, skipping");
            }
            if tally.observe(job, state).is_break() {
                break;
            }
        }

        let outcome = tally.outcome();
        match &outcome {
            JobsOutcome::Failed { job } => warn!(job = %job, "Mission job failed"),
            JobsOutcome::Succeeded => info!("All mission jobs completed"),
            JobsOutcome::Running => debug!("Mission jobs still running"),
        }
        Ok(plan_mission_jobs(mission, &outcome, now)?)
    }

    async fn execute(&self, mission: &Mission, plan: Plan) -> ControllerResult<Outcome> {
        if plan.is_noop() {
            return Ok(Outcome::Waiting);
        }
        debug!(
            jobs = plan.create_jobs.len(),
            next_phase = ?plan.next_phase(),
            delete = plan.delete_mission,
            "Executing plan"
        );

        for job in &plan.create_jobs {
            match self.platform.create_job(job).await {
                Ok(()) => info!(job = %job.name, role = %job.role, "Job created"),
                Err(e) if e.is_already_exists() => {
                    debug!(job = %job.name, "Job already exists");
                }
                Err(e) => {
                    warn!(job = %job.name, error = %e, "Failed to create job, will retry");
                    return Err(e.into());
                }
            }
        }

        let mut outcome = Outcome::Waiting;

        if let Some(status) = &plan.status {
            match self.platform.patch_mission_status(mission, status).await {
                Ok(updated) => {
                    info!(next_phase = %updated.phase(), "Mission status updated");
                    outcome = Outcome::Updated(updated.phase());
                }
                Err(e) if plan.delete_mission => {
                    warn!(error = %e, "Failed to stamp ended mission, deleting anyway");
                }
                Err(e) => {
                    if e.is_transient() {
                        info!(error = %e, "Status write failed, will retry");
                    } else {
                        warn!(error = %e, "Status write failed");
                    }
                    return Err(e.into());
                }
            }
        }

        if plan.delete_mission {
            match self.platform.delete_mission(&mission.name).await {
                Ok(()) => {
                    info!("Mission deleted");
                    outcome = Outcome::Deleted;
                }
                Err(e) if e.is_not_found() => {
                    debug!("Mission already deleted");
                    outcome = Outcome::Deleted;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to delete mission, will retry");
                }
            }
        }

        Ok(outcome)
    }
}

/// Coin-flip health-check verdict used in simulated mode.
fn roll_health_check() -> HealthCheckResult {
    if rand::random::<bool>() {
        HealthCheckResult::Passed
    } else {
        HealthCheckResult::Failed
    }
}
