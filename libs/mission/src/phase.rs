//! Mission phase state machine.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Position of a mission in its lifecycle.
///
/// Serialized as the PascalCase variant name. Any other value read back from
/// the resource store becomes [`Phase::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Created, health check not yet launched.
    #[default]
    Pending,

    /// Health-check job launched, waiting for its outcome.
    HealthChecking,

    /// Health check passed, data-collection jobs running.
    InMission,

    /// Health check failed. Terminal.
    Malfunctioning,

    /// All jobs succeeded. Terminal.
    Succeeded,

    /// A job failed during the mission. Terminal.
    Failed,

    /// A phase string this controller does not recognise.
    Unknown,
}

impl Phase {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pending => "Pending",
            Phase::HealthChecking => "HealthChecking",
            Phase::InMission => "InMission",
            Phase::Malfunctioning => "Malfunctioning",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Unknown => "Unknown",
        }
    }

    /// Parse a wire value. Unrecognised strings map to [`Phase::Unknown`].
    pub fn from_wire(value: &str) -> Self {
        match value {
            "Pending" => Phase::Pending,
            "HealthChecking" => Phase::HealthChecking,
            "InMission" => Phase::InMission,
            "Malfunctioning" => Phase::Malfunctioning,
            "Succeeded" => Phase::Succeeded,
            "Failed" => Phase::Failed,
            _ => Phase::Unknown,
        }
    }

    /// Human-readable status shown by the status API.
    pub fn display_label(&self) -> &'static str {
        match self {
            Phase::Pending => "Pending",
            Phase::HealthChecking => "Checking...",
            Phase::InMission => "In Mission",
            Phase::Succeeded => "Mission Succeeded",
            Phase::Failed => "Mission Failed",
            Phase::Malfunctioning => "Malfunction",
            Phase::Unknown => "Unknown",
        }
    }

    /// Returns true for phases that trigger mission deletion.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::Succeeded | Phase::Failed | Phase::Malfunctioning
        )
    }

    /// Lifecycle ordering. Unknown has no rank.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Phase::Pending => Some(0),
            Phase::HealthChecking => Some(1),
            Phase::InMission | Phase::Malfunctioning => Some(2),
            Phase::Succeeded | Phase::Failed => Some(3),
            Phase::Unknown => None,
        }
    }

    /// Returns true if `next` is a legal forward edge from `self`.
    pub fn can_transition_to(&self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Pending, Phase::HealthChecking)
                | (Phase::HealthChecking, Phase::InMission)
                | (Phase::HealthChecking, Phase::Malfunctioning)
                | (Phase::HealthChecking, Phase::Succeeded)
                | (Phase::InMission, Phase::Succeeded)
                | (Phase::InMission, Phase::Failed)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Phase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Phase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Phase::from_wire(&value))
    }
}

/// Verdict of a mission's health check, persisted in the mission status once
/// it has been decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum HealthCheckResult {
    Passed,
    Failed,
}

impl HealthCheckResult {
    pub fn passed(&self) -> bool {
        matches!(self, HealthCheckResult::Passed)
    }
}
