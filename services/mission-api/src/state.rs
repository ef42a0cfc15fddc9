//! Application state shared across request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use dronefleet_platform::Platform;
use tokio::sync::RwLock;

use crate::api::drones::DroneStatus;
use crate::registry::DroneRegistry;

/// Last non-idle status seen for each drone.
///
/// Bridges the gap between a mission's deletion and the next reset, so a
/// finished mission keeps reporting its verdict.
pub type StatusCache = RwLock<HashMap<String, DroneStatus>>;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    platform: Arc<dyn Platform>,
    drones: DroneRegistry,
    cache: StatusCache,
}

impl AppState {
    /// Create a new application state with an empty status cache.
    pub fn new(platform: Arc<dyn Platform>, drones: DroneRegistry) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                platform,
                drones,
                cache: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn platform(&self) -> &dyn Platform {
        self.inner.platform.as_ref()
    }

    pub fn drones(&self) -> &DroneRegistry {
        &self.inner.drones
    }

    pub fn cache(&self) -> &StatusCache {
        &self.inner.cache
    }
}
