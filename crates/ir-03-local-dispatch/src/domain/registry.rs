//! # Hosted Region Registry
//!
//! Every operation looks the target handle up among the regions this process
//! hosts. A miss is [`Local::NotLocal`], distinct from failure, telling the
//! caller to try the network.

use crate::domain::region::{Crossing, LocalRegion};
use crate::ports::RegionScene;
use parking_lot::RwLock;
use shared_types::{
    AgentCircuit, AgentData, AgentPosition, DispatchOutcome, RegionHandle, RideAlong, SceneObject,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Result of an in-process dispatch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Local<T> {
    /// No hosted region matches; try remote dispatch.
    NotLocal,
    /// A hosted region handled the call.
    Handled(T),
}

impl<T> Local<T> {
    pub fn is_local(&self) -> bool {
        matches!(self, Local::Handled(_))
    }

    pub fn handled(self) -> Option<T> {
        match self {
            Local::Handled(value) => Some(value),
            Local::NotLocal => None,
        }
    }
}

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Region {0} is already hosted by this process")]
    AlreadyHosted(RegionHandle),
}

/// Regions hosted by this process.
#[derive(Default)]
pub struct LocalDispatch {
    regions: RwLock<HashMap<RegionHandle, LocalRegion>>,
}

impl LocalDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start hosting a region.
    pub fn register(&self, scene: Arc<dyn RegionScene>) -> Result<(), RegistryError> {
        let region = LocalRegion::new(scene);
        let handle = region.handle();
        let mut regions = self.regions.write();
        if regions.contains_key(&handle) {
            return Err(RegistryError::AlreadyHosted(handle));
        }
        info!(region_handle = %handle, region_id = %region.region_id(), "Hosting region");
        regions.insert(handle, region);
        Ok(())
    }

    /// Stop hosting a region.
    pub fn deregister(&self, handle: RegionHandle) -> Option<Arc<dyn RegionScene>> {
        let removed = self.regions.write().remove(&handle);
        if removed.is_some() {
            info!(region_handle = %handle, "Stopped hosting region");
        }
        removed.map(|r| Arc::clone(r.scene()))
    }

    pub fn region(&self, handle: RegionHandle) -> Option<LocalRegion> {
        self.regions.read().get(&handle).cloned()
    }

    pub fn region_by_id(&self, region_id: Uuid) -> Option<LocalRegion> {
        self.regions
            .read()
            .values()
            .find(|r| r.region_id() == region_id)
            .cloned()
    }

    pub fn is_local(&self, handle: RegionHandle) -> bool {
        self.regions.read().contains_key(&handle)
    }

    pub fn hosted_handles(&self) -> Vec<RegionHandle> {
        let mut handles: Vec<_> = self.regions.read().keys().copied().collect();
        handles.sort();
        handles
    }

    pub fn len(&self) -> usize {
        self.regions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    pub async fn create_child_agent(&self, handle: RegionHandle, circuit: AgentCircuit, authorize: bool) -> Local<DispatchOutcome> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.create_child_agent(circuit, authorize).await),
            None => Local::NotLocal,
        }
    }

    pub async fn child_agent_update(&self, handle: RegionHandle, data: AgentData) -> Local<DispatchOutcome> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.child_agent_update(data).await),
            None => Local::NotLocal,
        }
    }

    pub async fn child_agent_position(&self, handle: RegionHandle, position: AgentPosition) -> Local<DispatchOutcome> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.child_agent_position(position).await),
            None => Local::NotLocal,
        }
    }

    pub async fn child_agent_update2(&self, handle: RegionHandle, data: AgentData) -> Local<DispatchOutcome> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.child_agent_update2(data).await),
            None => Local::NotLocal,
        }
    }

    pub async fn retrieve_root_agent(&self, handle: RegionHandle, agent_id: Uuid) -> Local<DispatchOutcome<AgentData>> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.retrieve_root_agent(agent_id).await),
            None => Local::NotLocal,
        }
    }

    pub async fn release_agent(&self, handle: RegionHandle, agent_id: Uuid) -> Local<DispatchOutcome> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.release_agent(agent_id).await),
            None => Local::NotLocal,
        }
    }

    pub async fn close_agent(&self, handle: RegionHandle, agent_id: Uuid) -> Local<DispatchOutcome> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.close_agent(agent_id).await),
            None => Local::NotLocal,
        }
    }

    /// Create an object. A local crossing takes its own copy of `object`.
    pub async fn create_object(
        &self,
        handle: RegionHandle,
        object: &SceneObject,
        ride_along: &RideAlong,
        crossing: Crossing,
    ) -> Local<DispatchOutcome> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.create_object(object.clone(), ride_along, crossing).await),
            None => Local::NotLocal,
        }
    }

    pub async fn create_object_from_item(&self, handle: RegionHandle, user_id: Uuid, item_id: Uuid) -> Local<DispatchOutcome> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.create_object_from_item(user_id, item_id).await),
            None => Local::NotLocal,
        }
    }

    pub async fn delete_object(&self, handle: RegionHandle, object_id: Uuid) -> Local<DispatchOutcome> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.delete_object(object_id).await),
            None => Local::NotLocal,
        }
    }

    /// Estate sync is addressed by region id rather than handle.
    pub async fn update_estate_info(&self, region_id: Uuid) -> Local<DispatchOutcome> {
        match self.region_by_id(region_id) {
            Some(region) => Local::Handled(region.update_estate_info().await),
            None => Local::NotLocal,
        }
    }

    pub async fn wait_scene_presence(&self, handle: RegionHandle, agent_id: Uuid, max_wait: Duration) -> Local<DispatchOutcome> {
        match self.region(handle) {
            Some(region) => Local::Handled(region.wait_scene_presence(agent_id, max_wait).await),
            None => Local::NotLocal,
        }
    }
}
