//! In-process platform.
//!
//! Keeps missions and jobs in memory with the semantics the controller
//! relies on: resource versions for optimistic concurrency, deterministic
//! duplicate detection for jobs and cascading delete through owner
//! references. Jobs never run on their own; tests drive them with
//! [`MemoryPlatform::set_job_state`].

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use dronefleet_mission::{
    DatastoreCredentials, JobDefinition, JobState, Mission, MissionSpec, MissionStatus,
};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::{Platform, PlatformError, PlatformResult};

/// Platform operation, used to target fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListMissions,
    GetMission,
    CreateMission,
    PatchStatus,
    DeleteMission,
    CreateJob,
    JobState,
    DatastoreCredentials,
}

#[derive(Debug, Clone)]
struct StoredJob {
    definition: JobDefinition,
    state: JobState,
}

#[derive(Default)]
struct Inner {
    missions: BTreeMap<String, Mission>,
    jobs: BTreeMap<String, StoredJob>,
    next_version: u64,
    credentials: Option<DatastoreCredentials>,
    faults: HashMap<Operation, VecDeque<PlatformError>>,
    job_submissions: Vec<String>,
    delete_requests: Vec<String>,
    status_patches: usize,
}

impl Inner {
    fn next_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    fn take_fault(&mut self, op: Operation) -> PlatformResult<()> {
        match self.faults.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory platform.
#[derive(Default)]
pub struct MemoryPlatform {
    inner: Mutex<Inner>,
}

impl MemoryPlatform {
    /// Create an empty platform without datastore credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty platform that serves `credentials`.
    pub fn with_credentials(credentials: DatastoreCredentials) -> Self {
        Self {
            inner: Mutex::new(Inner {
                credentials: Some(credentials),
                ..Inner::default()
            }),
        }
    }

    /// Make the next call to `op` fail with `error`. Faults queue up.
    pub async fn fail_next(&self, op: Operation, error: PlatformError) {
        self.inner
            .lock()
            .await
            .faults
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Set the state of a job. Returns false if the job does not exist.
    pub async fn set_job_state(&self, name: &str, state: JobState) -> bool {
        match self.inner.lock().await.jobs.get_mut(name) {
            Some(job) => {
                job.state = state;
                true
            }
            None => false,
        }
    }

    /// Drop a job without touching its mission.
    pub async fn remove_job(&self, name: &str) -> bool {
        self.inner.lock().await.jobs.remove(name).is_some()
    }

    /// Definition of a stored job.
    pub async fn job(&self, name: &str) -> Option<JobDefinition> {
        self.inner
            .lock()
            .await
            .jobs
            .get(name)
            .map(|job| job.definition.clone())
    }

    /// Names of all stored jobs.
    pub async fn job_names(&self) -> Vec<String> {
        self.inner.lock().await.jobs.keys().cloned().collect()
    }

    /// Every job submission, duplicates included, in call order.
    pub async fn job_submissions(&self) -> Vec<String> {
        self.inner.lock().await.job_submissions.clone()
    }

    /// Every mission deletion request, in call order.
    pub async fn delete_requests(&self) -> Vec<String> {
        self.inner.lock().await.delete_requests.clone()
    }

    /// Number of successful status patches.
    pub async fn status_patches(&self) -> usize {
        self.inner.lock().await.status_patches
    }

    /// Stored copy of a mission.
    pub async fn mission(&self, name: &str) -> Option<Mission> {
        self.inner.lock().await.missions.get(name).cloned()
    }
}

#[async_trait]
impl Platform for MemoryPlatform {
    async fn list_missions(&self) -> PlatformResult<Vec<Mission>> {
        let mut inner = self.inner.lock().await;
        inner.take_fault(Operation::ListMissions)?;
        Ok(inner.missions.values().cloned().collect())
    }

    async fn get_mission(&self, name: &str) -> PlatformResult<Option<Mission>> {
        let mut inner = self.inner.lock().await;
        inner.take_fault(Operation::GetMission)?;
        Ok(inner.missions.get(name).cloned())
    }

    async fn create_mission(&self, name: &str, spec: &MissionSpec) -> PlatformResult<Mission> {
        let mut inner = self.inner.lock().await;
        inner.take_fault(Operation::CreateMission)?;
        if inner.missions.contains_key(name) {
            return Err(PlatformError::AlreadyExists(name.to_string()));
        }

        let mission = Mission {
            name: name.to_string(),
            uid: Uuid::new_v4().to_string(),
            resource_version: Some(inner.next_version()),
            spec: spec.clone(),
            status: MissionStatus::default(),
        };
        inner.missions.insert(name.to_string(), mission.clone());
        debug!(mission = %name, "[MEMORY] Mission created");
        Ok(mission)
    }

    async fn patch_mission_status(
        &self,
        mission: &Mission,
        status: &MissionStatus,
    ) -> PlatformResult<Mission> {
        let mut inner = self.inner.lock().await;
        inner.take_fault(Operation::PatchStatus)?;
        let version = inner.next_version();

        let stored = inner
            .missions
            .get_mut(&mission.name)
            .ok_or_else(|| PlatformError::NotFound(mission.name.clone()))?;
        if stored.resource_version != mission.resource_version {
            return Err(PlatformError::Conflict(format!(
                "mission {} was modified (have {:?}, stored {:?})",
                mission.name, mission.resource_version, stored.resource_version
            )));
        }

        stored.status = status.clone();
        stored.resource_version = Some(version);
        let updated = stored.clone();
        inner.status_patches += 1;
        Ok(updated)
    }

    async fn delete_mission(&self, name: &str) -> PlatformResult<()> {
        let mut inner = self.inner.lock().await;
        inner.delete_requests.push(name.to_string());
        inner.take_fault(Operation::DeleteMission)?;

        let mission = inner
            .missions
            .remove(name)
            .ok_or_else(|| PlatformError::NotFound(name.to_string()))?;
        inner.jobs.retain(|_, job| job.definition.owner.uid != mission.uid);
        debug!(mission = %name, "[MEMORY] Mission deleted with its jobs");
        Ok(())
    }

    async fn create_job(&self, job: &JobDefinition) -> PlatformResult<()> {
        let mut inner = self.inner.lock().await;
        inner.job_submissions.push(job.name.clone());
        inner.take_fault(Operation::CreateJob)?;
        if inner.jobs.contains_key(&job.name) {
            return Err(PlatformError::AlreadyExists(job.name.clone()));
        }

        // A job whose owner is gone is collected straight away.
        let owner_alive = inner
            .missions
            .get(&job.owner.name)
            .is_some_and(|m| m.uid == job.owner.uid);
        if owner_alive {
            inner.jobs.insert(
                job.name.clone(),
                StoredJob {
                    definition: job.clone(),
                    state: JobState::Running,
                },
            );
        }
        Ok(())
    }

    async fn job_state(&self, name: &str) -> PlatformResult<Option<JobState>> {
        let mut inner = self.inner.lock().await;
        inner.take_fault(Operation::JobState)?;
        Ok(inner.jobs.get(name).map(|job| job.state))
    }

    async fn datastore_credentials(&self) -> PlatformResult<DatastoreCredentials> {
        let mut inner = self.inner.lock().await;
        inner.take_fault(Operation::DatastoreCredentials)?;
        inner
            .credentials
            .clone()
            .ok_or_else(|| PlatformError::NotFound("datastore credentials".to_string()))
    }
}
