//! Status transition planners.
//!
//! Each planner is a pure function from the mission's last-written status and
//! what was observed this tick to a [`Plan`]. The caller executes the plan:
//! jobs first, then the status patch, then deletion.

use chrono::{DateTime, Utc};
use dronefleet_mission::{
    DatastoreCredentials, HealthCheckResult, JobDefinition, JobRole, JobState, Mission,
    MissionStatus, Phase,
};

use crate::jobs::{collector_roles, job_for_role, JobTemplate};
use crate::tally::JobsOutcome;
use crate::{ReconcileError, ReconcileResult};

/// Side effects requested by a handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Jobs to create, in order.
    pub create_jobs: Vec<JobDefinition>,

    /// Status to write with a single patch.
    pub status: Option<MissionStatus>,

    /// Delete the mission after the status write.
    pub delete_mission: bool,
}

impl Plan {
    /// Nothing new was observed.
    pub fn wait() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.create_jobs.is_empty() && self.status.is_none() && !self.delete_mission
    }

    /// Phase the plan moves the mission to, if any.
    pub fn next_phase(&self) -> Option<Phase> {
        self.status.as_ref().map(|s| s.phase)
    }
}

/// Where the health-check verdict comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HealthOutcomeSource {
    /// Terminal state of the health-check job.
    #[default]
    Observed,

    /// A random verdict, rolled once the job is terminal and persisted in the
    /// mission status before it is acted on.
    Simulated,
}

/// Result of looking at the health-check job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthAssessment {
    /// The job has not finished.
    Waiting,

    /// The job is not in the store.
    Missing,

    /// A simulated verdict was rolled and must be persisted first.
    Record(HealthCheckResult),

    /// The verdict is known.
    Decided(HealthCheckResult),
}

/// Assess the health-check job.
///
/// `roll` is only called in simulated mode when the job is terminal and no
/// verdict has been persisted yet.
pub fn assess_health_check<F>(
    status: &MissionStatus,
    observed: Option<JobState>,
    source: HealthOutcomeSource,
    roll: F,
) -> HealthAssessment
where
    F: FnOnce() -> HealthCheckResult,
{
    let state = match observed {
        None => return HealthAssessment::Missing,
        Some(state) if !state.is_terminal() => return HealthAssessment::Waiting,
        Some(state) => state,
    };

    match source {
        HealthOutcomeSource::Observed => HealthAssessment::Decided(match state {
            JobState::Succeeded => HealthCheckResult::Passed,
            _ => HealthCheckResult::Failed,
        }),
        HealthOutcomeSource::Simulated => match status.health_check_result {
            Some(result) => HealthAssessment::Decided(result),
            None => HealthAssessment::Record(roll()),
        },
    }
}

/// Copy `status` into `next`, stamping the time.
fn transition(
    status: &MissionStatus,
    next: Phase,
    now: DateTime<Utc>,
) -> ReconcileResult<MissionStatus> {
    if !status.phase.can_transition_to(next) {
        return Err(ReconcileError::InvalidTransition {
            from: status.phase,
            to: next,
        });
    }
    Ok(MissionStatus {
        phase: next,
        last_update_time: Some(now),
        ..status.clone()
    })
}

/// Launch the health check and move to HealthChecking.
pub fn plan_start(
    mission: &Mission,
    template: &JobTemplate,
    now: DateTime<Utc>,
) -> ReconcileResult<Plan> {
    let job = job_for_role(mission, JobRole::HealthCheck, None, template);
    let mut status = transition(&mission.status, Phase::HealthChecking, now)?;
    status.health_check_job = Some(job.name.clone());

    Ok(Plan {
        create_jobs: vec![job],
        status: Some(status),
        delete_mission: false,
    })
}

/// Re-submit a health-check job that disappeared from the store.
///
/// The job is always recreated under its deterministic name. A status that
/// recorded any other name is corrected in the same plan so later ticks look
/// at the job that actually exists.
pub fn plan_recreate_health_check(mission: &Mission, template: &JobTemplate) -> Plan {
    let job = job_for_role(mission, JobRole::HealthCheck, None, template);

    let status = (mission.status.health_check_job.as_deref() != Some(job.name.as_str())).then(|| {
        MissionStatus {
            health_check_job: Some(job.name.clone()),
            ..mission.status.clone()
        }
    });

    Plan {
        create_jobs: vec![job],
        status,
        delete_mission: false,
    }
}

/// Persist a simulated verdict without changing phase.
pub fn plan_record_health_result(mission: &Mission, result: HealthCheckResult) -> Plan {
    Plan {
        status: Some(MissionStatus {
            health_check_result: Some(result),
            ..mission.status.clone()
        }),
        ..Plan::default()
    }
}

/// Health check passed: start the requested collectors.
///
/// With no collector requested the mission succeeds immediately.
pub fn plan_health_passed(
    mission: &Mission,
    datastore: Option<&DatastoreCredentials>,
    template: &JobTemplate,
    now: DateTime<Utc>,
) -> ReconcileResult<Plan> {
    let roles = collector_roles(&mission.spec);

    if roles.is_empty() {
        let mut status = transition(&mission.status, Phase::Succeeded, now)?;
        status.health_check_result = Some(HealthCheckResult::Passed);
        return Ok(Plan {
            status: Some(status),
            ..Plan::default()
        });
    }

    let datastore =
        datastore.ok_or_else(|| ReconcileError::MissingDatastore(mission.name.clone()))?;

    let jobs: Vec<_> = roles
        .into_iter()
        .map(|role| job_for_role(mission, role, Some(datastore), template))
        .collect();

    let mut status = transition(&mission.status, Phase::InMission, now)?;
    status.health_check_result = Some(HealthCheckResult::Passed);
    status.mission_jobs = jobs.iter().map(|job| job.name.clone()).collect();

    Ok(Plan {
        create_jobs: jobs,
        status: Some(status),
        delete_mission: false,
    })
}

/// Health check failed: the drone is malfunctioning. No collectors run.
pub fn plan_health_failed(mission: &Mission, now: DateTime<Utc>) -> ReconcileResult<Plan> {
    let mut status = transition(&mission.status, Phase::Malfunctioning, now)?;
    status.health_check_result = Some(HealthCheckResult::Failed);
    Ok(Plan {
        status: Some(status),
        ..Plan::default()
    })
}

/// Advance an in-flight mission from the combined job outcome.
pub fn plan_mission_jobs(
    mission: &Mission,
    outcome: &JobsOutcome,
    now: DateTime<Utc>,
) -> ReconcileResult<Plan> {
    let next = match outcome {
        JobsOutcome::Running => return Ok(Plan::wait()),
        JobsOutcome::Succeeded => Phase::Succeeded,
        JobsOutcome::Failed { .. } => Phase::Failed,
    };
    Ok(Plan {
        status: Some(transition(&mission.status, next, now)?),
        ..Plan::default()
    })
}

/// Stamp a terminal mission and delete it.
pub fn plan_finalize(mission: &Mission, now: DateTime<Utc>) -> ReconcileResult<Plan> {
    if !mission.phase().is_terminal() {
        return Err(ReconcileError::NotTerminal {
            mission: mission.name.clone(),
            phase: mission.phase(),
        });
    }
    Ok(Plan {
        create_jobs: Vec::new(),
        status: Some(MissionStatus {
            last_update_time: Some(now),
            ..mission.status.clone()
        }),
        delete_mission: true,
    })
}
