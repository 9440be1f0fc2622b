//! # Adapter Implementations
//!
//! Concrete implementations of the outbound ports the interregion
//! subsystems need from the host.
//!
//! | Adapter           | Port                                 |
//! |-------------------|--------------------------------------|
//! | `StandaloneScene` | `ir_03_local_dispatch::RegionScene`  |

pub mod scene;

pub use scene::StandaloneScene;
