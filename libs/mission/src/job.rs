//! Job model: roles, deterministic names, observed state and definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crd::{API_VERSION, KIND};
use crate::types::Mission;

/// Label carrying the owning mission name.
pub const MISSION_LABEL: &str = "drone.example.com/mission";

/// Label carrying the job role.
pub const ROLE_LABEL: &str = "drone.example.com/role";

/// Step of a mission a job backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobRole {
    HealthCheck,
    Coordinates,
    Battery,
}

impl JobRole {
    /// Name prefix for jobs of this role.
    pub fn prefix(&self) -> &'static str {
        match self {
            JobRole::HealthCheck => "health-check",
            JobRole::Coordinates => "coord-mission",
            JobRole::Battery => "battery-mission",
        }
    }

    /// Deterministic job name for a mission.
    pub fn job_name(&self, mission_name: &str) -> String {
        format!("{}-{}", self.prefix(), mission_name)
    }

    /// Whether jobs of this role write to the datastore.
    pub fn collects_data(&self) -> bool {
        !matches!(self, JobRole::HealthCheck)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobRole::HealthCheck => "health_check",
            JobRole::Coordinates => "coordinates",
            JobRole::Battery => "battery",
        }
    }
}

impl fmt::Display for JobRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Running)
    }
}

/// Reference from a job to the mission that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
}

impl OwnerReference {
    /// Owner reference pointing at a mission.
    pub fn mission(mission: &Mission) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            name: mission.name.clone(),
            uid: mission.uid.clone(),
        }
    }
}

/// Environment variable passed to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Pod restart policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartPolicy {
    Never,
}

impl RestartPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartPolicy::Never => "Never",
        }
    }
}

/// Definition of a job to submit to the job runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Deterministic job name.
    pub name: String,

    pub role: JobRole,

    /// Owning mission; deleting it deletes the job.
    pub owner: OwnerReference,

    /// Container image.
    pub image: String,

    pub container_name: String,

    /// Entrypoint.
    pub command: Vec<String>,

    /// Arguments to the entrypoint.
    pub args: Vec<String>,

    pub env: Vec<EnvVar>,

    pub restart_policy: RestartPolicy,

    /// Retries the job runner may attempt on its own. Always zero.
    pub backoff_limit: i32,
}

impl JobDefinition {
    /// Look up an environment variable by name.
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }
}
