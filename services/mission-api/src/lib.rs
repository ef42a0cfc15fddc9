//! dronefleet mission API library.
//!
//! This crate primarily ships a `mission-api` binary, but exposes a small
//! library surface so the router can be exercised in-process by tests.

pub mod api;
pub mod config;
pub mod registry;
pub mod state;
