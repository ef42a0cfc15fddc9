//! Shared fixtures for dronefleet tests.

use chrono::{DateTime, TimeZone, Utc};
use dronefleet_mission::{DatastoreCredentials, Mission, MissionSpec, MissionStatus};
use dronefleet_platform::MemoryPlatform;
use dronefleet_reconcile::JobTemplate;

/// Drones known to the fixture fleet.
pub const DRONES: [&str; 3] = ["D01", "D02", "D03"];

/// Fixed timestamp for deterministic assertions.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Datastore credentials served by [`platform`].
pub fn credentials() -> DatastoreCredentials {
    DatastoreCredentials {
        host: "drone-pg-cluster-rw".to_string(),
        database: "app".to_string(),
        user: "app".to_string(),
        password: "test-password".to_string(),
    }
}

/// Job template with the default worker image.
pub fn job_template() -> JobTemplate {
    JobTemplate::default()
}

/// Empty in-memory platform serving [`credentials`].
pub fn platform() -> MemoryPlatform {
    MemoryPlatform::with_credentials(credentials())
}

/// Mission spec for `drone_id`. Panics on an invalid drone ID.
pub fn spec(drone_id: &str, collect_coordinates: bool, collect_battery: bool) -> MissionSpec {
    match MissionSpec::new(drone_id, collect_coordinates, collect_battery) {
        Ok(spec) => spec,
        Err(e) => panic!("invalid fixture drone id {drone_id}: {e}"),
    }
}

/// Detached mission value, not stored anywhere.
pub fn mission(name: &str, spec: MissionSpec) -> Mission {
    Mission {
        name: name.to_string(),
        uid: format!("uid-{name}"),
        resource_version: Some("1".to_string()),
        spec,
        status: MissionStatus::default(),
    }
}
