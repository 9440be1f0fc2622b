//! A hosted region and the normalized operations run against it.

use crate::ports::RegionScene;
use shared_types::{
    AgentCircuit, AgentData, AgentPosition, DispatchError, DispatchOutcome, RegionHandle,
    RideAlong, SceneObject, Vector3,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// How an object reached the destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crossing {
    /// Source and destination share this process. The object is cloned and
    /// re-offset into the destination frame.
    Local { position_in_destination: Vector3 },
    /// The object arrived over the wire, already positioned.
    Wire,
}

/// Handle on one hosted region.
#[derive(Clone)]
pub struct LocalRegion {
    scene: Arc<dyn RegionScene>,
}

impl LocalRegion {
    pub fn new(scene: Arc<dyn RegionScene>) -> Self {
        Self { scene }
    }

    pub fn handle(&self) -> RegionHandle {
        self.scene.region_handle()
    }

    pub fn region_id(&self) -> Uuid {
        self.scene.region_id()
    }

    pub fn scene(&self) -> &Arc<dyn RegionScene> {
        &self.scene
    }

    /// Admit an agent. With `authorize` the scene's policy check runs first
    /// and a refusal is AccessDenied.
    pub async fn create_child_agent(&self, circuit: AgentCircuit, authorize: bool) -> DispatchOutcome {
        if authorize {
            self.scene
                .authorize_user(&circuit)
                .await
                .map_err(DispatchError::access_denied)?;
        }
        self.scene
            .new_user_connection(circuit)
            .await
            .map_err(DispatchError::error)
    }

    pub async fn child_agent_update(&self, data: AgentData) -> DispatchOutcome {
        let agent_id = data.agent_id;
        if self.scene.child_agent_update(data).await {
            Ok(())
        } else {
            Err(DispatchError::error(format!("update for agent {agent_id} rejected")))
        }
    }

    pub async fn child_agent_position(&self, position: AgentPosition) -> DispatchOutcome {
        let agent_id = position.agent_id;
        if self.scene.child_agent_position(position).await {
            Ok(())
        } else {
            Err(DispatchError::error(format!("position for agent {agent_id} rejected")))
        }
    }

    pub async fn child_agent_update2(&self, data: AgentData) -> DispatchOutcome {
        self.scene.child_agent_update2(data).await
    }

    pub async fn retrieve_root_agent(&self, agent_id: Uuid) -> DispatchOutcome<AgentData> {
        self.scene
            .retrieve_root_agent(agent_id)
            .await
            .ok_or_else(|| DispatchError::not_found(format!("no root agent {agent_id} in region {}", self.handle())))
    }

    pub async fn release_agent(&self, agent_id: Uuid) -> DispatchOutcome {
        if self.scene.release_agent(agent_id).await {
            Ok(())
        } else {
            Err(DispatchError::not_found(format!("agent {agent_id} not in region {}", self.handle())))
        }
    }

    pub async fn close_agent(&self, agent_id: Uuid) -> DispatchOutcome {
        if self.scene.close_agent(agent_id).await {
            Ok(())
        } else {
            Err(DispatchError::not_found(format!("agent {agent_id} not in region {}", self.handle())))
        }
    }

    /// Hand an object to the scene.
    ///
    /// A local crossing works on a copy so source and destination never
    /// share one object; attachments keep their position since they follow
    /// their avatar.
    pub async fn create_object(&self, object: SceneObject, ride_along: &RideAlong, crossing: Crossing) -> DispatchOutcome {
        let mut object = object;
        if let Crossing::Local { position_in_destination } = crossing {
            if !object.is_attachment {
                object.offset_for_new_region(position_in_destination);
            }
            object.avatars_to_expect = ride_along.expected();
        }
        debug!(object_id = %object.id, region_handle = %self.handle(), ?crossing, "Creating object");
        self.scene
            .create_object(object, ride_along.avatar_ids().to_vec())
            .await
    }

    pub async fn create_object_from_item(&self, user_id: Uuid, item_id: Uuid) -> DispatchOutcome {
        if self.scene.create_object_from_item(user_id, item_id).await {
            Ok(())
        } else {
            Err(DispatchError::error(format!("could not rez item {item_id} for {user_id}")))
        }
    }

    pub async fn delete_object(&self, object_id: Uuid) -> DispatchOutcome {
        if self.scene.delete_object(object_id).await {
            info!(%object_id, region_handle = %self.handle(), "Crossing abort, deleted object");
            Ok(())
        } else {
            Err(DispatchError::not_found(format!("object {object_id} not in region {}", self.handle())))
        }
    }

    pub async fn update_estate_info(&self) -> DispatchOutcome {
        if self.scene.reload_estate_settings().await {
            Ok(())
        } else {
            Err(DispatchError::error("estate settings could not be loaded"))
        }
    }

    pub async fn wait_scene_presence(&self, agent_id: Uuid, max_wait: Duration) -> DispatchOutcome {
        if self.scene.wait_scene_presence(agent_id, max_wait).await {
            Ok(())
        } else {
            Err(DispatchError::error(format!(
                "presence for {agent_id} not established within {}ms",
                max_wait.as_millis()
            )))
        }
    }
}

impl std::fmt::Debug for LocalRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRegion")
            .field("region_id", &self.region_id())
            .field("handle", &self.handle())
            .finish()
    }
}
