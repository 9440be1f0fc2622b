//! # IR-03 Local Dispatch Backend
//!
//! In-process delivery for regions hosted by this process.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`)
//!   - `LocalDispatch`: concurrent registry of hosted regions, keyed by handle
//!   - `LocalRegion`: normalizes scene results into `DispatchOutcome`
//!   - `Crossing`: local (clone + re-offset) versus wire-originated objects
//!
//! - **Ports Layer** (`ports/`)
//!   - `RegionScene`: driven port implemented by the scene simulation
//!   - `RecordingScene`: call-recording double for tests
//!
//! ## Contract
//!
//! | Lookup result | Return                          |
//! |---------------|---------------------------------|
//! | hosted        | `Local::Handled(outcome)`       |
//! | not hosted    | `Local::NotLocal` (not a fault) |

#![warn(clippy::all)]

pub mod domain;
pub mod ports;

pub use domain::{Crossing, Local, LocalDispatch, LocalRegion, RegistryError};
pub use ports::{RecordingScene, RegionScene, SceneCall};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
