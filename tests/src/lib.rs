//! # Interregion Test Suite
//!
//! Unified test crate exercising the subsystems together over real sockets.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs          # loopback hosts and stub peers
//!     ├── object_crossing.rs  # nonce suppression, compensating delete
//!     ├── agent_lifecycle.rs  # create/update/retrieve/release/close
//!     ├── peer_failures.rs    # absent, unreachable and untrusted peers
//!     ├── local_dispatch.rs   # co-hosted regions never touch the network
//!     └── region_host.rs      # two configured region-host containers
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ir-tests
//!
//! # One area
//! cargo test -p ir-tests integration::object_crossing::
//!
//! # Benchmarks
//! cargo bench -p ir-tests
//! ```

#![allow(dead_code)]

pub mod integration;
