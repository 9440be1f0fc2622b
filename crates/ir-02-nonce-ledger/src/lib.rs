//! # IR-02 Nonce Ledger
//!
//! Duplicate suppression for object crossings.
//!
//! ## Protocol role
//!
//! ```text
//! sender                              receiver
//!   │ POST /object2/ (nonce N) ──────────►│ slow / lost ack
//!   │ timeout                             │
//!   │ DELETE /object2/ (nonce N) ────────►│ ledger.remember(N)
//!   │                                     │
//!   │      late POST (nonce N) arrives ──►│ ledger.contains(N) → 204
//! ```
//!
//! ## Invariants
//!
//! - A create whose nonce is remembered is never applied.
//! - Entries are keyed by nonce only, never by object id.
//! - Entries older than the retention window are purged and stop
//!   suppressing.

#![warn(clippy::all)]

pub mod domain;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::{NonceGenerator, NonceLedger, DEFAULT_RETENTION};
pub use ports::{SystemTimeSource, TimeSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
