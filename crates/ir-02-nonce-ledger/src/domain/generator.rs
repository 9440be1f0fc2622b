//! Sender-side crossing nonce generation.

use shared_types::CrossingNonce;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter seeded once from a random value.
///
/// Constructed at process start; every crossing attempt takes `next()`.
#[derive(Debug)]
pub struct NonceGenerator {
    counter: AtomicU64,
}

impl NonceGenerator {
    /// Generator seeded from the thread-local RNG.
    pub fn new() -> Self {
        Self::with_seed(rand::random::<u64>())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            counter: AtomicU64::new(seed),
        }
    }

    /// Next nonce. Zero is skipped so it never collides with an unset value.
    pub fn next(&self) -> CrossingNonce {
        loop {
            let value = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
            if value != 0 {
                return CrossingNonce(value);
            }
        }
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}
