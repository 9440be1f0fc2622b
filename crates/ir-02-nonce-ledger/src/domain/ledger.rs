//! # Time-Bounded Nonce Ledger
//!
//! Remembers the nonce of every compensating delete for a retention window.
//! A create arriving with a remembered nonce is suppressed and the entry is
//! consumed.
//!
//! ## Design
//!
//! - `entries` maps nonce to its current expiry.
//! - `deadlines` is a min-heap of `(expiry, nonce)`; stale heap entries
//!   (consumed or re-remembered nonces) are skipped on pop.
//! - Every access sweeps expired entries first, so memory stays bounded by
//!   the number of deletes received within one window.

use crate::ports::{SystemTimeSource, TimeSource};
use parking_lot::Mutex;
use shared_types::CrossingNonce;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default retention: five minutes, well past the 15 s create timeout plus
/// any retry delay.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(300);

#[derive(Default)]
struct LedgerState {
    entries: HashMap<CrossingNonce, Instant>,
    deadlines: BinaryHeap<Reverse<(Instant, CrossingNonce)>>,
}

impl LedgerState {
    fn sweep(&mut self, now: Instant) -> usize {
        let mut purged = 0;
        while let Some(Reverse((expiry, nonce))) = self.deadlines.peek().copied() {
            if expiry > now {
                break;
            }
            self.deadlines.pop();
            if self.entries.get(&nonce) == Some(&expiry) {
                self.entries.remove(&nonce);
                purged += 1;
            }
        }
        purged
    }
}

/// Concurrent ledger of cancelled crossing attempts.
pub struct NonceLedger {
    state: Mutex<LedgerState>,
    retention: Duration,
    clock: Arc<dyn TimeSource>,
}

impl NonceLedger {
    /// Ledger with the default retention on the system clock.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_RETENTION, Arc::new(SystemTimeSource))
    }

    /// Ledger with a custom retention and clock.
    pub fn with_config(retention: Duration, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            retention,
            clock,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Remember `nonce` until `expiry`. Re-remembering replaces the expiry.
    pub fn remember(&self, nonce: CrossingNonce, expiry: Instant) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.entries.insert(nonce, expiry);
        state.deadlines.push(Reverse((expiry, nonce)));
        let purged = state.sweep(now);
        debug!(%nonce, purged, "Remembered cancelled crossing nonce");
    }

    /// Remember `nonce` for the configured retention window.
    pub fn remember_for_retention(&self, nonce: CrossingNonce) {
        let expiry = self.clock.now() + self.retention;
        self.remember(nonce, expiry);
    }

    /// Whether `nonce` is remembered. A hit consumes the entry.
    pub fn contains(&self, nonce: CrossingNonce) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.sweep(now);
        state.entries.remove(&nonce).is_some()
    }

    /// Drop every entry whose expiry has passed. Returns how many were purged.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        self.state.lock().sweep(now)
    }

    /// Number of live entries (including any not yet swept).
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NonceLedger {
    fn default() -> Self {
        Self::new()
    }
}
