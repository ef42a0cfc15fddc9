//! `DroneMission` custom resource definition.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::MissionError;
use crate::types::MissionStatus;

/// `apiVersion` of the mission resource.
pub const API_VERSION: &str = "drone.example.com/v1";

/// Resource kind.
pub const KIND: &str = "DroneMission";

/// Longest drone ID whose job names stay within the 63-character limit on
/// Kubernetes object names: `battery-mission-dm-<id>-<6 chars>`.
pub const MAX_DRONE_ID_LEN: usize = 37;

/// Requested mission. Immutable after creation.
#[derive(CustomResource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "drone.example.com",
    version = "v1",
    kind = "DroneMission",
    plural = "dronemissions",
    shortname = "dm",
    namespaced,
    status = "MissionStatus",
    printcolumn = r#"{"name":"Drone","type":"string","jsonPath":".spec.droneId"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MissionSpec {
    /// Drone the mission is flown by.
    pub drone_id: String,

    /// Run the coordinate collector after a passing health check.
    #[serde(default)]
    pub collect_coordinates: bool,

    /// Run the battery collector after a passing health check.
    #[serde(default)]
    pub collect_battery: bool,
}

impl MissionSpec {
    /// Create a validated mission spec.
    pub fn new(
        drone_id: impl Into<String>,
        collect_coordinates: bool,
        collect_battery: bool,
    ) -> Result<Self, MissionError> {
        let drone_id = drone_id.into();
        if drone_id.is_empty() {
            return Err(MissionError::EmptyDroneId);
        }
        if drone_id.len() > MAX_DRONE_ID_LEN {
            return Err(MissionError::DroneIdTooLong {
                len: drone_id.len(),
                max: MAX_DRONE_ID_LEN,
            });
        }
        if !drone_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(MissionError::InvalidDroneId(drone_id));
        }
        Ok(Self {
            drone_id,
            collect_coordinates,
            collect_battery,
        })
    }
}
