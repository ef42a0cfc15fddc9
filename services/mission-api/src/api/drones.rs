//! Drone status endpoints.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::SecondsFormat;
use dronefleet_mission::Mission;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::error::ApiError;
use crate::state::AppState;

/// Status reported for a drone with no live or cached mission.
pub const IDLE: &str = "Idle";

/// One row of `GET /drones`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneStatus {
    pub drone_id: String,

    /// Human-readable phase label, or "Idle".
    pub status: String,

    /// Time of the mission's last status write; empty if unknown.
    pub last_update_time: String,
}

impl DroneStatus {
    pub fn idle(drone_id: &str) -> Self {
        Self {
            drone_id: drone_id.to_string(),
            status: IDLE.to_string(),
            last_update_time: String::new(),
        }
    }

    pub fn from_mission(mission: &Mission) -> Self {
        Self {
            drone_id: mission.drone_id().to_string(),
            status: mission.phase().display_label().to_string(),
            last_update_time: mission
                .status
                .last_update_time
                .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                .unwrap_or_default(),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/drones", get(list_drones))
        .route("/drones/{drone_id}/status", delete(reset_status))
}

/// Report every registered drone.
///
/// A drone with a live mission reports that mission's phase. Otherwise it
/// reports its cached status, or Idle. Never fails: if missions cannot be
/// listed the cache alone is served.
async fn list_drones(State(state): State<AppState>) -> Json<Vec<DroneStatus>> {
    let mut live: HashMap<String, DroneStatus> = HashMap::new();

    match state.platform().list_missions().await {
        Ok(missions) => {
            for mission in missions
                .iter()
                .filter(|m| state.drones().contains(m.drone_id()))
            {
                let status = DroneStatus::from_mission(mission);
                live.insert(status.drone_id.clone(), status);
            }
        }
        Err(e) => warn!(error = %e, "Failed to list missions, serving cached statuses"),
    }

    let mut cache = state.cache().write().await;
    for status in live.values() {
        cache.insert(status.drone_id.clone(), status.clone());
    }

    let active: HashSet<&str> = live.keys().map(String::as_str).collect();
    let statuses = state
        .drones()
        .ids()
        .iter()
        .map(|id| {
            if active.contains(id.as_str()) {
                live[id].clone()
            } else {
                cache.get(id).cloned().unwrap_or_else(|| DroneStatus::idle(id))
            }
        })
        .collect();

    debug!(live = live.len(), cached = cache.len(), "Drone statuses served");
    Json(statuses)
}

/// Forget the cached status of one drone.
async fn reset_status(
    State(state): State<AppState>,
    Path(drone_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.drones().contains(&drone_id) {
        return Err(ApiError::not_found(
            "unknown_drone",
            format!("Unknown droneId: {drone_id}"),
        ));
    }

    if state.cache().write().await.remove(&drone_id).is_some() {
        info!(drone_id = %drone_id, "Cached drone status reset");
    }
    Ok(StatusCode::NO_CONTENT)
}
