//! Platform interface for the mission controller.
//!
//! The platform combines two external collaborators:
//! - **Resource store**: durable mission objects with optimistic-concurrency
//!   status patches and cascading delete through owner references
//! - **Job runner**: isolated, short-lived jobs with an observable terminal
//!   state and no retries of its own
//!
//! [`KubePlatform`] talks to a Kubernetes API server. [`MemoryPlatform`] keeps
//! everything in process for tests and local runs.

mod error;
mod k8s;
mod memory;

use async_trait::async_trait;
use dronefleet_mission::{
    DatastoreCredentials, JobDefinition, JobState, Mission, MissionSpec, MissionStatus,
};

pub use error::{PlatformError, PlatformResult};
pub use k8s::{job_state_of, to_kube_job, KubePlatform, DEFAULT_DATASTORE_SECRET};
pub use memory::{MemoryPlatform, Operation};

/// Resource store and job runner operations used by the controller and API.
#[async_trait]
pub trait Platform: Send + Sync {
    /// List every mission.
    async fn list_missions(&self) -> PlatformResult<Vec<Mission>>;

    /// Fetch one mission. `Ok(None)` if it does not exist.
    async fn get_mission(&self, name: &str) -> PlatformResult<Option<Mission>>;

    /// Create a mission with an empty status.
    async fn create_mission(&self, name: &str, spec: &MissionSpec) -> PlatformResult<Mission>;

    /// Replace the mission status.
    ///
    /// Fails with [`PlatformError::Conflict`] if the stored mission changed
    /// since `mission` was read.
    async fn patch_mission_status(
        &self,
        mission: &Mission,
        status: &MissionStatus,
    ) -> PlatformResult<Mission>;

    /// Delete a mission and, through owner references, its jobs.
    async fn delete_mission(&self, name: &str) -> PlatformResult<()>;

    /// Submit a job. Fails with [`PlatformError::AlreadyExists`] on a duplicate name.
    async fn create_job(&self, job: &JobDefinition) -> PlatformResult<()>;

    /// Observed job state. `Ok(None)` if the job does not exist.
    async fn job_state(&self, name: &str) -> PlatformResult<Option<JobState>>;

    /// Connection parameters for the collectors' datastore.
    async fn datastore_credentials(&self) -> PlatformResult<DatastoreCredentials>;
}
