//! Mission reconciliation primitives.
//!
//! This library holds the decision logic of the mission controller, free of
//! any I/O. Key concepts:
//!
//! - **Dispatch**: each (event kind, phase) pair selects exactly one handler.
//! - **Plan**: what a handler wants done: jobs to create, a new status to
//!   write in one patch, and whether to delete the mission.
//! - **Observation**: job states read from the platform this tick. Plans are
//!   derived only from observations and the mission's own last-written status.
//!
//! # Invariants
//!
//! - All operations are idempotent
//! - Decisions are deterministic given the same inputs
//! - Phases never regress; every phase change stamps `lastUpdateTime`

use std::time::Duration;

use dronefleet_mission::Phase;
use thiserror::Error;

mod dispatch;
mod jobs;
mod plan;
mod tally;

pub use dispatch::{dispatch, EventKind, Handler};
pub use jobs::{build_job, collector_roles, job_for_role, JobTemplate};
pub use plan::{
    assess_health_check, plan_finalize, plan_health_failed, plan_health_passed,
    plan_mission_jobs, plan_recreate_health_check, plan_record_health_result, plan_start,
    HealthAssessment, HealthOutcomeSource, Plan,
};
pub use tally::{tally, JobTally, JobsOutcome};

/// Result type for reconcile decisions.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Reconciliation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A plan asked for a phase change the state machine forbids.
    #[error("invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },

    /// Collector jobs were requested without datastore credentials.
    #[error("mission {0} needs datastore credentials for its collector jobs")]
    MissingDatastore(String),

    /// Finalization was requested for a mission that is still running.
    #[error("mission {mission} is not terminal (phase {phase})")]
    NotTerminal { mission: String, phase: Phase },
}

/// Default reconciliation interval.
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of missions reconciled concurrently.
pub const DEFAULT_MAX_CONCURRENT_RECONCILES: usize = 16;
