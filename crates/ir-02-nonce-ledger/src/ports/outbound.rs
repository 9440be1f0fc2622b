//! Driven ports for the nonce ledger.

use std::time::Instant;

/// Abstract interface for time.
///
/// Allows tests to move the ledger's clock past the retention window
/// without sleeping.
pub trait TimeSource: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;
}

/// Monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
