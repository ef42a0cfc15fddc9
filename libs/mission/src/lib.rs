//! # dronefleet-mission
//!
//! Resource model for drone missions.
//!
//! ## Design Principles
//!
//! - A mission is a durable resource; its spec is immutable after creation
//! - Only the controller writes mission status
//! - Phases only move forward (see [`Phase::can_transition_to`])
//! - Job names are derived deterministically from the mission name and role,
//!   so a repeated create for the same step is detectable as a duplicate
//!
//! ## Lifecycle
//!
//! ```text
//! Pending -> HealthChecking -> InMission      -> Succeeded | Failed
//!                           -> Malfunctioning
//! ```
//!
//! A mission in a terminal phase (Succeeded, Failed, Malfunctioning) is
//! deleted; its jobs are garbage-collected through their owner reference.

mod credentials;
mod crd;
mod error;
mod job;
mod name;
mod phase;
mod types;

pub use credentials::{env, DatastoreCredentials};
pub use crd::{DroneMission, MissionSpec, API_VERSION, KIND, MAX_DRONE_ID_LEN};
pub use error::MissionError;
pub use job::*;
pub use name::{generate_mission_name, mission_name_with_suffix, MISSION_NAME_PREFIX};
pub use phase::{HealthCheckResult, Phase};
pub use types::*;
