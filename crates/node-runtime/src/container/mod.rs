//! # Host Container
//!
//! Configuration and lifetime management of the interregion subsystems of
//! one region host process.

pub mod config;
pub mod host;

pub use config::{ConfigError, HostConfig};
pub use host::{HostError, RegionHost, LEDGER_SWEEP_INTERVAL};
