//! # IR-04 Transport Client
//!
//! Outbound calls to peer region hosts over HTTP.
//!
//! ## Protocol generations
//!
//! | Generation | Paths | Body |
//! |------------|-------|------|
//! | Legacy | `/agent/`, `/object/`, `/region/` | JSON structured map |
//! | Binary | `/agent2/`, `/object2/` | length-prefixed bincode, nonce in `x-nonce-id` |
//!
//! Every call has a fixed timeout from [`timeouts`]. Timeouts, refused
//! connections and non-success statuses are caught at the call site and
//! returned as a `DispatchError`; nothing here panics on a dead peer.

#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod timeouts;

pub use client::RegionClient;
pub use error::TransportError;
pub use timeouts::PeerTimeouts;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
