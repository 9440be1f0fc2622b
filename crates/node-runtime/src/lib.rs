//! # Node Runtime Library
//!
//! Building blocks of the `region-host` daemon, exposed for the integration
//! suite. The entry point is the `main.rs` binary.
//!
//! ## Startup Order
//!
//! 1. Load `HostConfig` (file, then environment) and validate it
//! 2. Initialize logging
//! 3. Build the `RegionHost` container and register hosted regions
//! 4. Serve the peer surface until Ctrl+C

#![warn(clippy::all)]

pub mod adapters;
pub mod container;
pub mod logging;

pub use adapters::StandaloneScene;
pub use container::{ConfigError, HostConfig, HostError, RegionHost};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
