//! End-to-end mission lifecycle against the in-memory platform.

use std::sync::Arc;

use dronefleet_mission::{
    env, mission_name_with_suffix, HealthCheckResult, JobRole, JobState, Mission, MissionSpec,
    MissionStatus, Phase,
};
use dronefleet_operator::controller::{ControllerError, ControllerResult, MissionController, Outcome};
use dronefleet_platform::{MemoryPlatform, Operation, Platform, PlatformError};
use dronefleet_reconcile::{EventKind, HealthOutcomeSource};
use dronefleet_testing::{job_template, platform, spec};
use rstest::rstest;

struct Harness {
    platform: Arc<MemoryPlatform>,
    controller: MissionController,
}

impl Harness {
    fn new() -> Self {
        Self::with_platform(platform(), HealthOutcomeSource::Observed)
    }

    fn with_platform(platform: MemoryPlatform, source: HealthOutcomeSource) -> Self {
        let platform = Arc::new(platform);
        let controller = controller(&platform, source);
        Self {
            platform,
            controller,
        }
    }

    async fn submit(&self, drone_id: &str, spec: MissionSpec) -> String {
        let name = mission_name_with_suffix(drone_id, "aaaaaa");
        self.platform.create_mission(&name, &spec).await.unwrap();
        name
    }

    async fn created(&self, name: &str) -> ControllerResult<Outcome> {
        self.controller.reconcile_named(EventKind::Created, name).await
    }

    async fn tick(&self, name: &str) -> ControllerResult<Outcome> {
        self.controller.reconcile_named(EventKind::Tick, name).await
    }

    async fn stored(&self, name: &str) -> Mission {
        self.platform.mission(name).await.unwrap()
    }

    async fn phase(&self, name: &str) -> Phase {
        self.stored(name).await.phase()
    }

    async fn finish(&self, name: &str, role: JobRole, state: JobState) {
        assert!(self.platform.set_job_state(&role.job_name(name), state).await);
    }
}

fn controller(platform: &Arc<MemoryPlatform>, source: HealthOutcomeSource) -> MissionController {
    let platform: Arc<dyn Platform> = platform.clone();
    MissionController::new(platform, job_template(), source)
}

fn unavailable() -> PlatformError {
    PlatformError::Unavailable("connection refused".to_string())
}

#[tokio::test]
async fn test_coordinates_mission_succeeds_and_is_cleaned_up() {
    let h = Harness::new();
    let name = h.submit("D01", spec("D01", true, false)).await;

    assert_eq!(h.created(&name).await.unwrap(), Outcome::Updated(Phase::HealthChecking));
    let health = JobRole::HealthCheck.job_name(&name);
    assert_eq!(h.platform.job_names().await, vec![health.clone()]);
    assert_eq!(h.stored(&name).await.status.health_check_job.as_deref(), Some(health.as_str()));

    let health_job = h.platform.job(&health).await.unwrap();
    assert_eq!(health_job.env_value(env::DRONE_ID), Some("D01"));
    assert_eq!(health_job.env_value(env::PASSWORD), None);

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Waiting);

    h.finish(&name, JobRole::HealthCheck, JobState::Succeeded).await;
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::InMission));

    let coords = JobRole::Coordinates.job_name(&name);
    let status = h.stored(&name).await.status;
    assert_eq!(status.mission_jobs, vec![coords.clone()]);
    assert_eq!(status.health_check_result, Some(HealthCheckResult::Passed));
    assert!(status.last_update_time.is_some());

    let coords_job = h.platform.job(&coords).await.unwrap();
    assert_eq!(coords_job.env_value(env::HOST), Some("drone-pg-cluster-rw"));
    assert_eq!(coords_job.env_value(env::PASSWORD), Some("test-password"));
    assert!(h.platform.job(&JobRole::Battery.job_name(&name)).await.is_none());

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Waiting);

    h.finish(&name, JobRole::Coordinates, JobState::Succeeded).await;
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::Succeeded));

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Deleted);
    assert!(h.platform.mission(&name).await.is_none());
    assert!(h.platform.job_names().await.is_empty());

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Absent);
}

#[tokio::test]
async fn test_mission_without_collectors_succeeds_after_health_check() {
    let h = Harness::new();
    let name = h.submit("D02", spec("D02", false, false)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Succeeded).await;

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::Succeeded));
    assert!(h.stored(&name).await.status.mission_jobs.is_empty());
    assert_eq!(h.platform.job_submissions().await.len(), 1);

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Deleted);
}

#[tokio::test]
async fn test_failed_health_check_marks_drone_malfunctioning() {
    let h = Harness::new();
    let name = h.submit("D03", spec("D03", true, true)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Failed).await;

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::Malfunctioning));
    let status = h.stored(&name).await.status;
    assert!(status.mission_jobs.is_empty());
    assert_eq!(status.health_check_result, Some(HealthCheckResult::Failed));
    assert_eq!(
        h.platform.job_submissions().await,
        vec![JobRole::HealthCheck.job_name(&name)]
    );

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Deleted);
    assert_eq!(h.platform.delete_requests().await, vec![name]);
}

#[rstest]
#[case::coordinates_fails(JobRole::Coordinates, JobRole::Battery)]
#[case::battery_fails(JobRole::Battery, JobRole::Coordinates)]
#[tokio::test]
async fn test_any_failed_job_fails_the_mission(#[case] failing: JobRole, #[case] other: JobRole) {
    let h = Harness::new();
    let name = h.submit("D01", spec("D01", true, true)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Succeeded).await;
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::InMission));
    assert_eq!(h.stored(&name).await.status.mission_jobs.len(), 2);

    h.finish(&name, failing, JobState::Failed).await;
    assert_eq!(h.platform.job_state(&other.job_name(&name)).await.unwrap(), Some(JobState::Running));

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::Failed));
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Deleted);
}

#[tokio::test]
async fn test_failed_health_check_job_fails_mission_in_flight() {
    let h = Harness::new();
    let name = h.submit("D02", spec("D02", true, false)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Succeeded).await;
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::InMission));

    h.finish(&name, JobRole::HealthCheck, JobState::Failed).await;
    assert_eq!(
        h.platform.job_state(&JobRole::Coordinates.job_name(&name)).await.unwrap(),
        Some(JobState::Running)
    );

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::Failed));
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Deleted);
    assert!(h.platform.mission(&name).await.is_none());
}

#[tokio::test]
async fn test_vanished_job_holds_mission_in_flight() {
    let h = Harness::new();
    let name = h.submit("D01", spec("D01", true, true)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Succeeded).await;
    h.tick(&name).await.unwrap();

    assert!(h.platform.remove_job(&JobRole::Coordinates.job_name(&name)).await);
    h.finish(&name, JobRole::Battery, JobState::Succeeded).await;

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Waiting);
    assert_eq!(h.phase(&name).await, Phase::InMission);
}

#[tokio::test]
async fn test_stale_view_does_not_duplicate_work() {
    let h = Harness::new();
    let name = h.submit("D01", spec("D01", true, false)).await;
    let stale = h.stored(&name).await;

    assert_eq!(
        h.controller.reconcile(EventKind::Created, &stale).await.unwrap(),
        Outcome::Updated(Phase::HealthChecking)
    );
    let before = h.stored(&name).await;

    let err = h.controller.reconcile(EventKind::Created, &stale).await.unwrap_err();
    assert!(matches!(err, ControllerError::Platform(PlatformError::Conflict(_))));

    assert_eq!(h.platform.job_names().await.len(), 1);
    assert_eq!(h.platform.job_submissions().await.len(), 2);
    assert_eq!(h.platform.status_patches().await, 1);
    assert_eq!(h.stored(&name).await, before);
}

#[tokio::test]
async fn test_redelivered_creation_event_is_ignored() {
    let h = Harness::new();
    let name = h.submit("D01", spec("D01", false, true)).await;

    h.created(&name).await.unwrap();
    assert_eq!(h.created(&name).await.unwrap(), Outcome::Ignored);
    assert_eq!(h.platform.job_submissions().await.len(), 1);
}

#[tokio::test]
async fn test_unknown_phase_is_left_alone() {
    let h = Harness::new();
    let name = h.submit("D01", spec("D01", true, false)).await;
    let mission = h.stored(&name).await;
    let status = MissionStatus {
        phase: Phase::Unknown,
        ..MissionStatus::default()
    };
    h.platform.patch_mission_status(&mission, &status).await.unwrap();

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Ignored);
    assert_eq!(h.created(&name).await.unwrap(), Outcome::Ignored);
    assert!(h.platform.job_submissions().await.is_empty());
}

#[tokio::test]
async fn test_failed_read_changes_nothing() {
    let h = Harness::new();
    let name = h.submit("D01", spec("D01", true, false)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Succeeded).await;
    let patches = h.platform.status_patches().await;

    h.platform.fail_next(Operation::JobState, unavailable()).await;
    assert!(h.tick(&name).await.is_err());
    assert_eq!(h.phase(&name).await, Phase::HealthChecking);
    assert_eq!(h.platform.status_patches().await, patches);

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::InMission));
}

#[tokio::test]
async fn test_failed_job_creation_is_retried_on_next_tick() {
    let h = Harness::new();
    let name = h.submit("D01", spec("D01", true, false)).await;

    h.platform.fail_next(Operation::CreateJob, unavailable()).await;
    assert!(h.created(&name).await.is_err());
    assert_eq!(h.phase(&name).await, Phase::Pending);
    assert!(h.platform.job_names().await.is_empty());

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::HealthChecking));
    assert_eq!(h.platform.job_names().await.len(), 1);
}

#[tokio::test]
async fn test_missing_datastore_blocks_collectors() {
    let h = Harness::with_platform(MemoryPlatform::new(), HealthOutcomeSource::Observed);
    let name = h.submit("D01", spec("D01", true, false)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Succeeded).await;

    let err = h.tick(&name).await.unwrap_err();
    assert!(matches!(err, ControllerError::Platform(PlatformError::NotFound(_))));
    assert_eq!(h.phase(&name).await, Phase::HealthChecking);
    assert_eq!(h.platform.job_names().await.len(), 1);
}

#[tokio::test]
async fn test_missing_health_check_job_is_resubmitted() {
    let h = Harness::new();
    let name = h.submit("D01", spec("D01", true, false)).await;
    let health = JobRole::HealthCheck.job_name(&name);

    h.created(&name).await.unwrap();
    assert!(h.platform.remove_job(&health).await);

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Waiting);
    assert_eq!(h.platform.job_names().await, vec![health.clone()]);
    assert_eq!(h.platform.job_submissions().await, vec![health.clone(), health]);
    assert_eq!(h.phase(&name).await, Phase::HealthChecking);
}

#[tokio::test]
async fn test_foreign_health_check_job_name_is_replaced() {
    let h = Harness::new();
    let name = h.submit("D01", spec("D01", false, false)).await;
    let mission = h.stored(&name).await;
    let status = MissionStatus {
        phase: Phase::HealthChecking,
        health_check_job: Some("hc-legacy".to_string()),
        ..MissionStatus::default()
    };
    h.platform.patch_mission_status(&mission, &status).await.unwrap();

    let health = JobRole::HealthCheck.job_name(&name);
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::HealthChecking));
    assert_eq!(h.stored(&name).await.status.health_check_job.as_deref(), Some(health.as_str()));
    assert_eq!(h.platform.job_names().await, vec![health]);

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Waiting);
    assert_eq!(h.platform.job_submissions().await.len(), 1);

    h.finish(&name, JobRole::HealthCheck, JobState::Succeeded).await;
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::Succeeded));
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Deleted);
}

#[tokio::test]
async fn test_simulated_verdict_survives_controller_restart() {
    let h = Harness::with_platform(platform(), HealthOutcomeSource::Simulated);
    let name = h.submit("D02", spec("D02", false, false)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Succeeded).await;

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::HealthChecking));
    let verdict = h.stored(&name).await.status.health_check_result.unwrap();

    let restarted = controller(&h.platform, HealthOutcomeSource::Simulated);
    let expected = if verdict.passed() {
        Phase::Succeeded
    } else {
        Phase::Malfunctioning
    };
    assert_eq!(
        restarted.reconcile_named(EventKind::Tick, &name).await.unwrap(),
        Outcome::Updated(expected)
    );
    assert_eq!(h.stored(&name).await.status.health_check_result, Some(verdict));
}

#[tokio::test]
async fn test_failed_delete_is_retried() {
    let h = Harness::new();
    let name = h.submit("D02", spec("D02", false, false)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Succeeded).await;
    h.tick(&name).await.unwrap();

    h.platform.fail_next(Operation::DeleteMission, unavailable()).await;
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Updated(Phase::Succeeded));
    assert!(h.platform.mission(&name).await.is_some());

    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Deleted);
    assert_eq!(h.platform.delete_requests().await.len(), 2);
}

#[tokio::test]
async fn test_delete_of_missing_mission_counts_as_done() {
    let h = Harness::new();
    let name = h.submit("D02", spec("D02", false, false)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Failed).await;
    h.tick(&name).await.unwrap();

    h.platform
        .fail_next(Operation::DeleteMission, PlatformError::NotFound(name.clone()))
        .await;
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Deleted);
}

#[tokio::test]
async fn test_failed_stamp_does_not_block_deletion() {
    let h = Harness::new();
    let name = h.submit("D02", spec("D02", false, false)).await;

    h.created(&name).await.unwrap();
    h.finish(&name, JobRole::HealthCheck, JobState::Failed).await;
    h.tick(&name).await.unwrap();

    h.platform.fail_next(Operation::PatchStatus, unavailable()).await;
    assert_eq!(h.tick(&name).await.unwrap(), Outcome::Deleted);
    assert!(h.platform.mission(&name).await.is_none());
}
