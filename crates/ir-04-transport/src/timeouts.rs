//! Per-operation timeouts. A client fixes its table when it is built;
//! callers cannot override a timeout per call.

use std::time::Duration;

/// Region registration; the peer may itself be validating the caller.
pub const REGION_REGISTRATION: Duration = Duration::from_secs(90);

/// Full object-graph crossing and its compensating delete.
pub const CREATE_OBJECT: Duration = Duration::from_secs(15);

/// Create child agent, retrieve, release, close, estate sync.
pub const QUERY: Duration = Duration::from_secs(10);

/// Full agent snapshot push.
pub const AGENT_UPDATE: Duration = Duration::from_secs(10);

/// Position-only delta. The most latency-sensitive call.
pub const AGENT_POSITION: Duration = Duration::from_secs(3);

/// How long a destination is asked to wait for an agent's presence.
pub const PRESENCE_WAIT: Duration = Duration::from_secs(10);

/// Client-side bound on the wait-for-presence call.
pub const WAIT_PRESENCE: Duration = Duration::from_secs(12);

/// TCP connect bound shared by all calls.
pub const CONNECT: Duration = Duration::from_secs(3);

/// Timeout table a [`crate::RegionClient`] applies to every call it makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerTimeouts {
    /// Object crossing and its compensating delete.
    pub create_object: Duration,
    pub query: Duration,
    pub agent_update: Duration,
    pub agent_position: Duration,
    pub wait_presence: Duration,
    pub connect: Duration,
}

impl Default for PeerTimeouts {
    fn default() -> Self {
        Self {
            create_object: CREATE_OBJECT,
            query: QUERY,
            agent_update: AGENT_UPDATE,
            agent_position: AGENT_POSITION,
            wait_presence: WAIT_PRESENCE,
            connect: CONNECT,
        }
    }
}
