//! Simulator-facing dispatch API.
//!
//! Every operation resolves its target once, then runs against either the
//! local region or the remote peer. Call sites never branch on locality.

use crate::domain::{InterregionMode, RemotePeer, Route};
use ir_02_nonce_ledger::NonceGenerator;
use ir_03_local_dispatch::{Crossing, LocalDispatch};
use ir_04_transport::{timeouts, RegionClient};
use ir_05_region_directory::{DirectoryError, RegionDirectory};
use shared_types::{
    AgentCircuit, AgentData, AgentPosition, DispatchError, DispatchOutcome, DispatchResult,
    ObjectCodec, RegionHandle, RideAlong, SceneObject, Vector3,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
struct RemoteAccess {
    directory: Arc<dyn RegionDirectory>,
    client: RegionClient,
}

/// Uniform interregion API over co-hosted and remote regions.
///
/// Cheap to clone; clones share the registry, directory and nonce counter.
#[derive(Clone)]
pub struct RegionDispatcher {
    local: Arc<LocalDispatch>,
    remote: Option<RemoteAccess>,
    codec: Arc<dyn ObjectCodec>,
    nonces: Arc<NonceGenerator>,
}

impl RegionDispatcher {
    /// Dispatcher that reaches non-local regions over HTTP.
    pub fn rest(
        local: Arc<LocalDispatch>,
        directory: Arc<dyn RegionDirectory>,
        client: RegionClient,
        codec: Arc<dyn ObjectCodec>,
    ) -> Self {
        Self {
            local,
            remote: Some(RemoteAccess { directory, client }),
            codec,
            nonces: Arc::new(NonceGenerator::new()),
        }
    }

    /// Dispatcher that only reaches co-hosted regions.
    pub fn local_only(local: Arc<LocalDispatch>, codec: Arc<dyn ObjectCodec>) -> Self {
        Self {
            local,
            remote: None,
            codec,
            nonces: Arc::new(NonceGenerator::new()),
        }
    }

    /// Replace the nonce counter, e.g. with a fixed seed.
    pub fn with_nonces(mut self, nonces: NonceGenerator) -> Self {
        self.nonces = Arc::new(nonces);
        self
    }

    pub fn mode(&self) -> InterregionMode {
        match self.remote {
            Some(_) => InterregionMode::Rest,
            None => InterregionMode::Local,
        }
    }

    pub fn local(&self) -> &Arc<LocalDispatch> {
        &self.local
    }

    pub fn is_local(&self, handle: RegionHandle) -> bool {
        self.local.is_local(handle)
    }

    /// Decide where operations for `handle` go.
    pub async fn resolve(&self, handle: RegionHandle) -> DispatchOutcome<Route> {
        if let Some(region) = self.local.region(handle) {
            return Ok(Route::Local(region));
        }

        let remote = self.remote.as_ref().ok_or_else(|| {
            DispatchError::not_found(format!(
                "region {handle} is not hosted here and interregion transport is local-only"
            ))
        })?;

        let endpoint = remote
            .directory
            .lookup_handle(handle)
            .await
            .map_err(directory_failure)?;

        Ok(Route::Remote(RemotePeer {
            endpoint,
            client: remote.client.clone(),
        }))
    }

    // =========================================================================
    // AGENTS
    // =========================================================================

    /// Admit a child agent at `handle`. With `authorize_user` the
    /// destination's policy check runs first.
    pub async fn create_child_agent(&self, handle: RegionHandle, circuit: &AgentCircuit, authorize_user: bool) -> DispatchOutcome {
        match self.resolve(handle).await? {
            Route::Local(region) => region.create_child_agent(circuit.clone(), authorize_user).await,
            Route::Remote(peer) => {
                peer.client
                    .create_child_agent(&peer.endpoint, circuit, authorize_user)
                    .await
            }
        }
    }

    pub async fn child_agent_update(&self, handle: RegionHandle, data: &AgentData) -> DispatchOutcome {
        match self.resolve(handle).await? {
            Route::Local(region) => region.child_agent_update(data.clone()).await,
            Route::Remote(peer) => peer.client.child_agent_update(&peer.endpoint, data).await,
        }
    }

    pub async fn child_agent_position(&self, handle: RegionHandle, position: &AgentPosition) -> DispatchOutcome {
        match self.resolve(handle).await? {
            Route::Local(region) => region.child_agent_position(position.clone()).await,
            Route::Remote(peer) => peer.client.child_agent_position(&peer.endpoint, position).await,
        }
    }

    /// Full-state update over the binary generation. MethodUnavailable means
    /// the peer predates it.
    pub async fn child_agent_update2(&self, handle: RegionHandle, data: &AgentData) -> DispatchOutcome {
        match self.resolve(handle).await? {
            Route::Local(region) => region.child_agent_update2(data.clone()).await,
            Route::Remote(peer) => peer.client.child_agent_update2(&peer.endpoint, data).await,
        }
    }

    /// Binary full-state update, falling back to the legacy PUT for peers
    /// without it.
    pub async fn push_agent_state(&self, handle: RegionHandle, data: &AgentData) -> DispatchOutcome {
        match self.child_agent_update2(handle, data).await {
            Err(e) if e.kind == DispatchResult::MethodUnavailable => {
                debug!(region_handle = %handle, agent_id = %data.agent_id, "Peer lacks agent2, using legacy update");
                self.child_agent_update(handle, data).await
            }
            other => other,
        }
    }

    /// [`Self::child_agent_update2`] on a spawned task.
    pub fn update_child_agent2_detached(&self, handle: RegionHandle, data: AgentData) -> JoinHandle<DispatchOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.child_agent_update2(handle, &data).await })
    }

    /// Pull the full snapshot of an agent that is root at `handle`.
    pub async fn retrieve_root_agent(&self, handle: RegionHandle, agent_id: Uuid) -> DispatchOutcome<AgentData> {
        match self.resolve(handle).await? {
            Route::Local(region) => region.retrieve_root_agent(agent_id).await,
            Route::Remote(peer) => peer.client.retrieve_root_agent(&peer.endpoint, agent_id).await,
        }
    }

    /// Tell the origin region it may reclaim the agent.
    pub async fn release_agent(&self, handle: RegionHandle, agent_id: Uuid) -> DispatchOutcome {
        match self.resolve(handle).await? {
            Route::Local(region) => region.release_agent(agent_id).await,
            Route::Remote(peer) => peer.client.release_agent(&peer.endpoint, agent_id).await,
        }
    }

    /// Terminate a child presence.
    pub async fn close_agent(&self, handle: RegionHandle, agent_id: Uuid) -> DispatchOutcome {
        match self.resolve(handle).await? {
            Route::Local(region) => region.close_agent(agent_id).await,
            Route::Remote(peer) => peer.client.close_agent(&peer.endpoint, agent_id).await,
        }
    }

    /// [`Self::close_agent`] on a spawned task.
    pub fn close_agent_detached(&self, handle: RegionHandle, agent_id: Uuid) -> JoinHandle<DispatchOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.close_agent(handle, agent_id).await })
    }

    /// Wait for the agent's presence to be established at `handle`.
    pub async fn wait_scene_presence(&self, handle: RegionHandle, agent_id: Uuid) -> DispatchOutcome {
        match self.resolve(handle).await? {
            Route::Local(region) => region.wait_scene_presence(agent_id, timeouts::PRESENCE_WAIT).await,
            Route::Remote(peer) => peer.client.wait_scene_presence(&peer.endpoint, agent_id).await,
        }
    }

    // =========================================================================
    // OBJECTS
    // =========================================================================

    /// Hand `object` to the region at `handle`.
    ///
    /// `position` is the object's position in the destination's frame. A
    /// remote crossing is one attempt with one nonce; when it fails with
    /// anything but AccessDenied a compensating delete carrying the same
    /// nonce follows, so a slow create that lands later is suppressed.
    pub async fn create_object(
        &self,
        handle: RegionHandle,
        object: &SceneObject,
        position: Option<Vector3>,
        ride_along: &RideAlong,
    ) -> DispatchOutcome {
        match self.resolve(handle).await? {
            Route::Local(region) => {
                let crossing = Crossing::Local {
                    position_in_destination: position.unwrap_or(object.position),
                };
                region.create_object(object.clone(), ride_along, crossing).await
            }
            Route::Remote(peer) => self.cross_object(&peer, object, position, ride_along).await,
        }
    }

    async fn cross_object(
        &self,
        peer: &RemotePeer,
        object: &SceneObject,
        position: Option<Vector3>,
        ride_along: &RideAlong,
    ) -> DispatchOutcome {
        let snapshot = self
            .codec
            .encode(object)
            .map_err(|e| DispatchError::error(format!("could not serialize object {}: {e}", object.id)))?;
        let nonce = self.nonces.next();

        let result = peer
            .client
            .create_object2(&peer.endpoint, object.id, &snapshot, position, ride_along, nonce)
            .await;

        if let Err(e) = &result {
            if e.kind != DispatchResult::AccessDenied {
                info!(
                    object_id = %object.id,
                    nonce = nonce.0,
                    peer = %peer.endpoint.base_url(),
                    reason = %e.reason,
                    "Object crossing failed, sending compensating delete"
                );
                if let Err(abort) = peer.client.delete_object2(&peer.endpoint, object.id, nonce).await {
                    debug!(object_id = %object.id, nonce = nonce.0, reason = %abort.reason, "Compensating delete not confirmed");
                }
            }
        }
        result
    }

    /// Rez an inventory item both hosts can reach.
    pub async fn create_object_from_item(&self, handle: RegionHandle, user_id: Uuid, item_id: Uuid) -> DispatchOutcome {
        match self.resolve(handle).await? {
            Route::Local(region) => region.create_object_from_item(user_id, item_id).await,
            Route::Remote(peer) => {
                peer.client
                    .create_object_from_item(&peer.endpoint, user_id, item_id)
                    .await
            }
        }
    }

    /// Delete an object. A remote delete carries a fresh nonce, which the
    /// peer remembers like any other.
    pub async fn delete_object(&self, handle: RegionHandle, object_id: Uuid) -> DispatchOutcome {
        match self.resolve(handle).await? {
            Route::Local(region) => region.delete_object(object_id).await,
            Route::Remote(peer) => {
                peer.client
                    .delete_object2(&peer.endpoint, object_id, self.nonces.next())
                    .await
            }
        }
    }

    // =========================================================================
    // REGIONS
    // =========================================================================

    /// Ask the region with `region_id` to reload its estate settings.
    pub async fn update_estate_info(&self, region_id: Uuid) -> DispatchOutcome {
        if let Some(region) = self.local.region_by_id(region_id) {
            return region.update_estate_info().await;
        }

        let remote = self.remote.as_ref().ok_or_else(|| {
            DispatchError::not_found(format!(
                "region {region_id} is not hosted here and interregion transport is local-only"
            ))
        })?;
        let endpoint = remote
            .directory
            .lookup_id(region_id)
            .await
            .map_err(directory_failure)?;
        remote.client.update_estate_info(&endpoint).await
    }
}

fn directory_failure(e: DirectoryError) -> DispatchError {
    match e {
        DirectoryError::HandleNotFound(_) | DirectoryError::IdNotFound(_) => DispatchError::not_found(e.to_string()),
        DirectoryError::Timeout(_) | DirectoryError::Unavailable(_) => DispatchError::error(e.to_string()),
    }
}

impl std::fmt::Debug for RegionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionDispatcher")
            .field("mode", &self.mode())
            .field("hosted", &self.local.len())
            .finish()
    }
}
