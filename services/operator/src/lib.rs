//! dronefleet operator library.
//!
//! This crate primarily ships the `drone-operator` binary, but we expose a
//! small library surface to enable integration testing.

pub mod config;
pub mod controller;
pub mod worker;
