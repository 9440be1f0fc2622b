//! # IR-01 Peer Authenticator
//!
//! Flat trust model for region-to-region calls: every peer holding the grid
//! send key is trusted for every operation.
//!
//! ## Flow
//!
//! ```text
//! inbound request ──► PeerAuthLayer ──► router ──► handler
//!                         │
//!                         └── missing / wrong credential ──► 401, warn!(peer)
//! ```
//!
//! The credential is `authorization: Basic base64(key:key)`, compared in
//! constant time against the locally configured key.

#![warn(clippy::all)]

pub mod domain;
pub mod layer;

pub use domain::{credentials_match, generate_authorization, GridSendKey};
pub use layer::{PeerAuthConfig, PeerAuthLayer, PeerAuthService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
