//! # IR-06 Remote Dispatch Orchestrator
//!
//! The one interface the simulator uses for interregion work, and the
//! server side of the same protocol.
//!
//! ## Control flow
//!
//! ```text
//! simulator ──► RegionDispatcher::resolve(handle)
//!                  ├─ Local(region)  ──► LocalRegion (no network)
//!                  └─ Remote(peer)   ──► RegionClient ──► peer /agent, /object2, ...
//!                                                            │
//!                                      peer inbound::router ◄┘
//!                                        PeerAuthLayer → path → decode → LocalDispatch
//! ```
//!
//! ## Object crossing
//!
//! One attempt, one nonce. A failed create (anything but Ok or
//! AccessDenied) is followed by a compensating delete with the same nonce;
//! the receiver remembers delete nonces and answers a later create for
//! them with 204.

#![warn(clippy::all)]

pub mod domain;
pub mod inbound;
pub mod service;

pub use domain::{InterregionMode, RemotePeer, Route};
pub use inbound::{router, InboundState};
pub use service::RegionDispatcher;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
