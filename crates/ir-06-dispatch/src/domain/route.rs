//! Where an operation for a region handle goes.

use ir_03_local_dispatch::LocalRegion;
use ir_04_transport::RegionClient;
use shared_types::RegionEndpoint;

/// A region hosted elsewhere, with the client that reaches it.
#[derive(Debug, Clone)]
pub struct RemotePeer {
    pub endpoint: RegionEndpoint,
    pub client: RegionClient,
}

/// Result of resolving a region handle.
#[derive(Debug, Clone)]
pub enum Route {
    /// Hosted in this process. No network call is made.
    Local(LocalRegion),
    /// Hosted by a peer.
    Remote(RemotePeer),
}

impl Route {
    pub fn is_local(&self) -> bool {
        matches!(self, Route::Local(_))
    }
}
