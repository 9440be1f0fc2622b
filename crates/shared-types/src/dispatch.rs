//! # Dispatch Outcomes
//!
//! Every operation, local or remote, is normalized into this closed set
//! before it reaches the simulator. HTTP statuses, connection failures and
//! missing peers all end up here.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Normalized result of an interregion operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispatchResult {
    Ok,
    /// Destination policy refused the operation (ban list, permissions).
    AccessDenied,
    /// Unknown region, agent or object.
    NotFound,
    /// Peer does not implement this protocol generation.
    MethodUnavailable,
    /// Transport failure or internal error at the peer.
    Error,
}

impl DispatchResult {
    /// Outcome for an HTTP status returned by a peer.
    ///
    /// 204 is the duplicate-suppressed path: the peer did nothing, which the
    /// sender must not treat as a successful create.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=203 | 205..=299 => DispatchResult::Ok,
            403 => DispatchResult::AccessDenied,
            404 => DispatchResult::NotFound,
            405 | 501 => DispatchResult::MethodUnavailable,
            _ => DispatchResult::Error,
        }
    }

    /// Whether a caller may sensibly retry.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, DispatchResult::Error)
    }
}

impl fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchResult::Ok => "ok",
            DispatchResult::AccessDenied => "access denied",
            DispatchResult::NotFound => "not found",
            DispatchResult::MethodUnavailable => "method unavailable",
            DispatchResult::Error => "error",
        };
        f.write_str(name)
    }
}

/// Failed dispatch with an operator-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {reason}")]
pub struct DispatchError {
    pub kind: DispatchResult,
    pub reason: String,
}

impl DispatchError {
    #[must_use]
    pub fn new(kind: DispatchResult, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::new(DispatchResult::AccessDenied, reason)
    }

    #[must_use]
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::new(DispatchResult::NotFound, reason)
    }

    #[must_use]
    pub fn method_unavailable(reason: impl Into<String>) -> Self {
        Self::new(DispatchResult::MethodUnavailable, reason)
    }

    #[must_use]
    pub fn error(reason: impl Into<String>) -> Self {
        Self::new(DispatchResult::Error, reason)
    }
}

/// Result type returned by every dispatch operation.
pub type DispatchOutcome<T = ()> = Result<T, DispatchError>;

/// Collapse an outcome into its [`DispatchResult`].
pub trait OutcomeExt {
    fn result(&self) -> DispatchResult;
}

impl<T> OutcomeExt for DispatchOutcome<T> {
    fn result(&self) -> DispatchResult {
        match self {
            Ok(_) => DispatchResult::Ok,
            Err(e) => e.kind,
        }
    }
}
