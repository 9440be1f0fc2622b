//! # IR-05 Region Directory Adapter
//!
//! Thin collaborator: given a `RegionHandle` or region id, return a
//! `RegionEndpoint` or "not found".
//!
//! - `RegionDirectory`: the port the dispatcher consumes
//! - `InMemoryRegionDirectory`: static neighbours from configuration
//! - `TimeoutDirectory`: bounds any directory's lookups by a deadline

#![warn(clippy::all)]

pub mod adapters;
pub mod error;
pub mod ports;

pub use adapters::{InMemoryRegionDirectory, TimeoutDirectory, DEFAULT_LOOKUP_TIMEOUT};
pub use error::DirectoryError;
pub use ports::RegionDirectory;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
