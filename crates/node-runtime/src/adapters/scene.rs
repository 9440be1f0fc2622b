//! # Standalone Scene
//!
//! `RegionScene` for a host running without an attached simulator. It keeps
//! presence and object bookkeeping in memory so the interregion surface can
//! be exercised end to end (grid smoke tests, loopback deployments).
//!
//! No inventory or asset service sits behind it, so rezzing from an
//! inventory item always fails.

use async_trait::async_trait;
use ir_03_local_dispatch::RegionScene;
use parking_lot::RwLock;
use shared_types::{AgentCircuit, AgentData, AgentPosition, DispatchError, DispatchOutcome, RegionHandle, SceneObject};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Default)]
struct SceneState {
    child_agents: HashMap<Uuid, AgentCircuit>,
    root_agents: HashMap<Uuid, AgentData>,
    objects: HashMap<Uuid, SceneObject>,
    banned: HashSet<Uuid>,
}

/// In-memory region.
pub struct StandaloneScene {
    name: String,
    region_id: Uuid,
    handle: RegionHandle,
    state: RwLock<SceneState>,
    arrivals: Notify,
}

impl StandaloneScene {
    pub fn new(name: impl Into<String>, region_id: Uuid, handle: RegionHandle) -> Self {
        Self {
            name: name.into(),
            region_id,
            handle,
            state: RwLock::new(SceneState::default()),
            arrivals: Notify::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Refuse root entry and v2 updates for `agent_id`.
    pub fn ban(&self, agent_id: Uuid) {
        self.state.write().banned.insert(agent_id);
    }

    pub fn has_child_agent(&self, agent_id: Uuid) -> bool {
        self.state.read().child_agents.contains_key(&agent_id)
    }

    pub fn root_agent(&self, agent_id: Uuid) -> Option<AgentData> {
        self.state.read().root_agents.get(&agent_id).cloned()
    }

    pub fn object(&self, object_id: Uuid) -> Option<SceneObject> {
        self.state.read().objects.get(&object_id).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.state.read().objects.len()
    }

    fn is_banned(&self, agent_id: Uuid) -> bool {
        self.state.read().banned.contains(&agent_id)
    }

    fn store_agent(&self, data: AgentData) {
        self.state.write().root_agents.insert(data.agent_id, data);
        self.arrivals.notify_waiters();
    }
}

#[async_trait]
impl RegionScene for StandaloneScene {
    fn region_id(&self) -> Uuid {
        self.region_id
    }

    fn region_handle(&self) -> RegionHandle {
        self.handle
    }

    async fn authorize_user(&self, circuit: &AgentCircuit) -> Result<(), String> {
        if self.is_banned(circuit.agent_id) {
            return Err(format!("{} is not allowed in {}", circuit.full_name(), self.name));
        }
        Ok(())
    }

    async fn new_user_connection(&self, circuit: AgentCircuit) -> Result<(), String> {
        info!(region = %self.name, agent_id = %circuit.agent_id, child = circuit.child, "Agent circuit admitted");
        self.state.write().child_agents.insert(circuit.agent_id, circuit);
        Ok(())
    }

    async fn child_agent_update(&self, data: AgentData) -> bool {
        self.store_agent(data);
        true
    }

    async fn child_agent_position(&self, position: AgentPosition) -> bool {
        let mut state = self.state.write();
        match state.root_agents.get_mut(&position.agent_id) {
            Some(agent) => {
                agent.position = position.position;
                agent.velocity = position.velocity;
                agent.center = position.center;
                true
            }
            None => state.child_agents.contains_key(&position.agent_id),
        }
    }

    async fn child_agent_update2(&self, data: AgentData) -> DispatchOutcome {
        if self.is_banned(data.agent_id) {
            return Err(DispatchError::access_denied(format!("agent {} is banned", data.agent_id)));
        }
        self.store_agent(data);
        Ok(())
    }

    async fn retrieve_root_agent(&self, agent_id: Uuid) -> Option<AgentData> {
        self.root_agent(agent_id)
    }

    async fn release_agent(&self, agent_id: Uuid) -> bool {
        let released = self.state.write().root_agents.remove(&agent_id).is_some();
        debug!(region = %self.name, %agent_id, released, "Release agent");
        released
    }

    async fn close_agent(&self, agent_id: Uuid) -> bool {
        let mut state = self.state.write();
        let child = state.child_agents.remove(&agent_id).is_some();
        let root = state.root_agents.remove(&agent_id).is_some();
        child || root
    }

    async fn create_object(&self, object: SceneObject, avatars: Vec<Uuid>) -> DispatchOutcome {
        info!(
            region = %self.name,
            object_id = %object.id,
            avatars = avatars.len(),
            "Object entered region"
        );
        self.state.write().objects.insert(object.id, object);
        Ok(())
    }

    async fn create_object_from_item(&self, user_id: Uuid, item_id: Uuid) -> bool {
        warn!(region = %self.name, %user_id, %item_id, "No inventory service; cannot rez item");
        false
    }

    async fn delete_object(&self, object_id: Uuid) -> bool {
        self.state.write().objects.remove(&object_id).is_some()
    }

    async fn reload_estate_settings(&self) -> bool {
        info!(region = %self.name, "Estate settings reloaded");
        true
    }

    async fn wait_scene_presence(&self, agent_id: Uuid, max_wait: Duration) -> bool {
        let present = async {
            loop {
                let notified = self.arrivals.notified();
                if self.state.read().root_agents.contains_key(&agent_id) {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(max_wait, present).await.is_ok()
    }
}
