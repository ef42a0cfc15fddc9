//! Mission creation endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use dronefleet_mission::{generate_mission_name, MissionSpec};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::ApiError;
use crate::state::AppState;

/// Body of `POST /mission`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissionRequest {
    pub drone_id: Option<String>,

    #[serde(default)]
    pub collect_coordinates: bool,

    #[serde(default)]
    pub collect_battery: bool,
}

/// Response of `POST /mission`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMissionResponse {
    pub message: String,
    pub cr_name: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/mission", post(create_mission))
}

async fn create_mission(
    State(state): State<AppState>,
    payload: Result<Json<CreateMissionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateMissionResponse>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request("invalid_body", e.body_text()))?;

    let drone_id = req
        .drone_id
        .filter(|id| state.drones().contains(id))
        .ok_or_else(|| ApiError::bad_request("invalid_drone_id", "Invalid droneId"))?;

    let spec = MissionSpec::new(drone_id, req.collect_coordinates, req.collect_battery)
        .map_err(|e| ApiError::bad_request("invalid_drone_id", e.to_string()))?;
    let name = generate_mission_name(&spec.drone_id);

    match state.platform().create_mission(&name, &spec).await {
        Ok(mission) => {
            info!(
                mission = %mission.name,
                drone_id = %spec.drone_id,
                collect_coordinates = spec.collect_coordinates,
                collect_battery = spec.collect_battery,
                "Mission created"
            );
            Ok((
                StatusCode::CREATED,
                Json(CreateMissionResponse {
                    message: "Mission created".to_string(),
                    cr_name: mission.name,
                }),
            ))
        }
        Err(e) => {
            warn!(mission = %name, error = %e, "Failed to create mission");
            Err(ApiError::internal(
                "resource_creation_failed",
                format!("Failed to create Kubernetes resource: {}", e.reason()),
            ))
        }
    }
}
