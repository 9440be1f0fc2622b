//! # Shared Types Crate
//!
//! Domain entities and wire messages shared by every interregion subsystem.
//!
//! ## Contents
//!
//! | Module     | Purpose                                                       |
//! |------------|---------------------------------------------------------------|
//! | `entities` | `RegionHandle`, `RegionEndpoint`, `Vector3`, `CrossingNonce`  |
//! | `agent`    | `AgentCircuit`, `AgentData`, `AgentPosition`                  |
//! | `object`   | `SceneObject`, `ObjectSnapshot`, `RideAlong`, `ObjectCodec`   |
//! | `dispatch` | `DispatchResult`, `DispatchError`, `DispatchOutcome<T>`       |
//! | `path`     | `/{kind}/{uuid}/{handle}/{action}` parsing and building       |
//! | `wire`     | legacy structured-map bodies and length-prefixed binary frames |
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate or host
//!   boundary is defined here.
//! - **Closed outcome set**: transport failures never escape as faults; they
//!   are normalized into `DispatchResult` before reaching the simulator.

#![warn(clippy::all)]

pub mod agent;
pub mod dispatch;
pub mod entities;
pub mod errors;
pub mod object;
pub mod path;
pub mod wire;

pub use agent::*;
pub use dispatch::*;
pub use entities::*;
pub use errors::*;
pub use object::*;
pub use path::EntityPath;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
