//! The fleet of drones the API knows about.

use anyhow::{bail, Result};
use dronefleet_mission::MissionSpec;

/// Drones served by the default registry.
pub const DEFAULT_DRONES: [&str; 3] = ["D01", "D02", "D03"];

/// Ordered, fixed set of drone IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroneRegistry {
    ids: Vec<String>,
}

impl DroneRegistry {
    /// Build a registry. Duplicates are dropped, order is kept.
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            // Reuse the mission spec rules so every registered drone can fly.
            if let Err(e) = MissionSpec::new(&id, false, false) {
                bail!("invalid drone id in registry: {e}");
            }
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        if unique.is_empty() {
            bail!("drone registry cannot be empty");
        }
        Ok(Self { ids: unique })
    }

    /// Parse a comma-separated list.
    pub fn parse(list: &str) -> Result<Self> {
        Self::new(list.split(',').map(str::trim).filter(|id| !id.is_empty()))
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, drone_id: &str) -> bool {
        self.ids.iter().any(|id| id == drone_id)
    }
}

impl Default for DroneRegistry {
    fn default() -> Self {
        Self {
            ids: DEFAULT_DRONES.iter().map(|id| id.to_string()).collect(),
        }
    }
}
