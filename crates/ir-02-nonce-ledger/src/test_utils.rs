//! Test utilities for the nonce ledger.
//!
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```ignore
//! use ir_02_nonce_ledger::test_utils::ManualTimeSource;
//! use ir_02_nonce_ledger::TimeSource;
//! use std::time::Duration;
//!
//! let clock = ManualTimeSource::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now() - start, Duration::from_secs(5));
//! ```

use crate::ports::TimeSource;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualTimeSource {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}
