//! Configuration for the mission API.

use std::net::SocketAddr;

use anyhow::{Context, Result};

use crate::registry::DroneRegistry;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub namespace: String,
    pub log_level: String,
    pub drones: DroneRegistry,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("DRONEFLEET_API_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:5001".to_string());
        let listen_addr = listen_addr
            .parse()
            .with_context(|| format!("invalid DRONEFLEET_API_LISTEN_ADDR: {listen_addr}"))?;

        let namespace = lookup("DRONEFLEET_NAMESPACE").unwrap_or_else(|| "default".to_string());

        let log_level = lookup("DRONEFLEET_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let drones = match lookup("DRONEFLEET_DRONES") {
            Some(list) => DroneRegistry::parse(&list)?,
            None => DroneRegistry::default(),
        };

        Ok(Self {
            listen_addr,
            namespace,
            log_level,
            drones,
        })
    }
}
