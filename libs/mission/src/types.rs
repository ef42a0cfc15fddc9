//! Mission resource types.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::MissionSpec;
use crate::phase::{HealthCheckResult, Phase};

/// Controller-owned mission status.
///
/// A mission with no status object is equivalent to the default value
/// (phase `Pending`, nothing recorded).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MissionStatus {
    /// Current lifecycle phase.
    #[serde(default)]
    #[schemars(with = "String")]
    pub phase: Phase,

    /// Time of the last status write (RFC 3339, UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub last_update_time: Option<DateTime<Utc>>,

    /// Name of the health-check job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_job: Option<String>,

    /// Names of the data-collection jobs, in creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mission_jobs: Vec<String>,

    /// Health-check verdict, once decided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_result: Option<HealthCheckResult>,
}

impl MissionStatus {
    /// Every job associated with the mission: mission jobs first, then the
    /// health-check job.
    pub fn associated_jobs(&self) -> Vec<String> {
        let mut jobs = self.mission_jobs.clone();
        if let Some(health) = &self.health_check_job {
            jobs.push(health.clone());
        }
        jobs
    }
}

/// A mission as observed in the resource store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mission {
    /// Unique resource name.
    pub name: String,

    /// Store-assigned UID, used for owner references.
    pub uid: String,

    /// Store-assigned version for optimistic concurrency.
    pub resource_version: Option<String>,

    pub spec: MissionSpec,

    pub status: MissionStatus,
}

impl Mission {
    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.status.phase
    }

    pub fn drone_id(&self) -> &str {
        &self.spec.drone_id
    }
}
