//! # Driven Ports (Outbound SPI)
//!
//! The scene simulation a hosted region exposes to the dispatch backend.
//! Physics, scripting and permissions live behind this trait.

use async_trait::async_trait;
use shared_types::{AgentCircuit, AgentData, AgentPosition, DispatchOutcome, RegionHandle, SceneObject};
use std::time::Duration;
use uuid::Uuid;

/// In-process handlers of one hosted region.
///
/// # Thread Safety
///
/// Called concurrently from inbound request tasks and from the local
/// simulator; implementations must be `Send + Sync`.
#[async_trait]
pub trait RegionScene: Send + Sync {
    fn region_id(&self) -> Uuid;

    fn region_handle(&self) -> RegionHandle;

    /// Policy check for a root-bound entry (ban lists, estate access).
    /// `Err` carries the refusal reason.
    async fn authorize_user(&self, circuit: &AgentCircuit) -> Result<(), String>;

    /// Admit the agent's circuit. `Err` carries the failure reason.
    async fn new_user_connection(&self, circuit: AgentCircuit) -> Result<(), String>;

    /// Apply a full child agent snapshot.
    async fn child_agent_update(&self, data: AgentData) -> bool;

    /// Apply a position-only child agent update.
    async fn child_agent_position(&self, position: AgentPosition) -> bool;

    /// Apply a full snapshot with a typed outcome (agent-update-v2).
    async fn child_agent_update2(&self, data: AgentData) -> DispatchOutcome;

    /// Snapshot of a root agent, if present.
    async fn retrieve_root_agent(&self, agent_id: Uuid) -> Option<AgentData>;

    /// The agent has left; reclaim its root presence.
    async fn release_agent(&self, agent_id: Uuid) -> bool;

    /// Forcibly terminate a child presence.
    async fn close_agent(&self, agent_id: Uuid) -> bool;

    /// Insert an object arriving from another region.
    async fn create_object(&self, object: SceneObject, avatars: Vec<Uuid>) -> DispatchOutcome;

    /// Rez an object from an inventory item both hosts share.
    async fn create_object_from_item(&self, user_id: Uuid, item_id: Uuid) -> bool;

    /// Delete an object. `false` when it is not in the scene.
    async fn delete_object(&self, object_id: Uuid) -> bool;

    /// Reload estate settings from storage. `false` leaves the old ones.
    async fn reload_estate_settings(&self) -> bool;

    /// Wait up to `max_wait` for the agent's presence to be established.
    async fn wait_scene_presence(&self, agent_id: Uuid, max_wait: Duration) -> bool;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// One call received by a [`RecordingScene`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneCall {
    AuthorizeUser(Uuid),
    NewUserConnection(Uuid),
    ChildAgentUpdate(Uuid),
    ChildAgentPosition(Uuid),
    ChildAgentUpdate2(Uuid),
    RetrieveRootAgent(Uuid),
    ReleaseAgent(Uuid),
    CloseAgent(Uuid),
    CreateObject(Uuid),
    CreateObjectFromItem { user_id: Uuid, item_id: Uuid },
    DeleteObject(Uuid),
    ReloadEstateSettings,
    WaitScenePresence(Uuid),
}

/// Scene double that records every call and keeps just enough state to
/// answer queries.
pub struct RecordingScene {
    region_id: Uuid,
    handle: RegionHandle,
    calls: Mutex<Vec<SceneCall>>,
    banned: Mutex<HashSet<Uuid>>,
    child_agents: Mutex<HashMap<Uuid, AgentCircuit>>,
    root_agents: Mutex<HashMap<Uuid, AgentData>>,
    present: Mutex<HashSet<Uuid>>,
    objects: Mutex<Vec<SceneObject>>,
    last_update: Mutex<Option<AgentData>>,
    last_position: Mutex<Option<AgentPosition>>,
    deny_objects: AtomicBool,
    fail_objects: AtomicBool,
}

impl RecordingScene {
    pub fn new(region_id: Uuid, handle: RegionHandle) -> Self {
        Self {
            region_id,
            handle,
            calls: Mutex::new(Vec::new()),
            banned: Mutex::new(HashSet::new()),
            child_agents: Mutex::new(HashMap::new()),
            root_agents: Mutex::new(HashMap::new()),
            present: Mutex::new(HashSet::new()),
            objects: Mutex::new(Vec::new()),
            last_update: Mutex::new(None),
            last_position: Mutex::new(None),
            deny_objects: AtomicBool::new(false),
            fail_objects: AtomicBool::new(false),
        }
    }

    /// Scene at grid coordinates with a fresh region id.
    pub fn at_grid(x: u32, y: u32) -> Self {
        Self::new(Uuid::new_v4(), RegionHandle::from_grid(x, y))
    }

    pub fn ban(&self, agent_id: Uuid) {
        self.banned.lock().insert(agent_id);
    }

    pub fn add_root_agent(&self, data: AgentData) {
        self.root_agents.lock().insert(data.agent_id, data);
    }

    pub fn mark_present(&self, agent_id: Uuid) {
        self.present.lock().insert(agent_id);
    }

    /// Refuse every object create with AccessDenied.
    pub fn deny_objects(&self, deny: bool) {
        self.deny_objects.store(deny, Ordering::SeqCst);
    }

    /// Fail every object create with Error.
    pub fn fail_objects(&self, fail: bool) {
        self.fail_objects.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SceneCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn objects(&self) -> Vec<SceneObject> {
        self.objects.lock().clone()
    }

    /// How many copies of `object_id` the scene holds.
    pub fn object_count(&self, object_id: Uuid) -> usize {
        self.objects.lock().iter().filter(|o| o.id == object_id).count()
    }

    pub fn child_agent(&self, agent_id: Uuid) -> Option<AgentCircuit> {
        self.child_agents.lock().get(&agent_id).cloned()
    }

    pub fn last_update(&self) -> Option<AgentData> {
        self.last_update.lock().clone()
    }

    pub fn last_position(&self) -> Option<AgentPosition> {
        self.last_position.lock().clone()
    }

    fn record(&self, call: SceneCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl RegionScene for RecordingScene {
    fn region_id(&self) -> Uuid {
        self.region_id
    }

    fn region_handle(&self) -> RegionHandle {
        self.handle
    }

    async fn authorize_user(&self, circuit: &AgentCircuit) -> Result<(), String> {
        self.record(SceneCall::AuthorizeUser(circuit.agent_id));
        if self.banned.lock().contains(&circuit.agent_id) {
            return Err(format!("{} is banned from this region", circuit.full_name()));
        }
        Ok(())
    }

    async fn new_user_connection(&self, circuit: AgentCircuit) -> Result<(), String> {
        self.record(SceneCall::NewUserConnection(circuit.agent_id));
        self.child_agents.lock().insert(circuit.agent_id, circuit);
        Ok(())
    }

    async fn child_agent_update(&self, data: AgentData) -> bool {
        self.record(SceneCall::ChildAgentUpdate(data.agent_id));
        *self.last_update.lock() = Some(data);
        true
    }

    async fn child_agent_position(&self, position: AgentPosition) -> bool {
        self.record(SceneCall::ChildAgentPosition(position.agent_id));
        *self.last_position.lock() = Some(position);
        true
    }

    async fn child_agent_update2(&self, data: AgentData) -> DispatchOutcome {
        self.record(SceneCall::ChildAgentUpdate2(data.agent_id));
        if self.banned.lock().contains(&data.agent_id) {
            return Err(shared_types::DispatchError::access_denied("agent is banned"));
        }
        *self.last_update.lock() = Some(data);
        Ok(())
    }

    async fn retrieve_root_agent(&self, agent_id: Uuid) -> Option<AgentData> {
        self.record(SceneCall::RetrieveRootAgent(agent_id));
        self.root_agents.lock().get(&agent_id).cloned()
    }

    async fn release_agent(&self, agent_id: Uuid) -> bool {
        self.record(SceneCall::ReleaseAgent(agent_id));
        self.root_agents.lock().remove(&agent_id).is_some()
    }

    async fn close_agent(&self, agent_id: Uuid) -> bool {
        self.record(SceneCall::CloseAgent(agent_id));
        self.child_agents.lock().remove(&agent_id).is_some()
    }

    async fn create_object(&self, object: SceneObject, _avatars: Vec<Uuid>) -> DispatchOutcome {
        self.record(SceneCall::CreateObject(object.id));
        if self.deny_objects.load(Ordering::SeqCst) {
            return Err(shared_types::DispatchError::access_denied("object entry refused"));
        }
        if self.fail_objects.load(Ordering::SeqCst) {
            return Err(shared_types::DispatchError::error("object rez failed"));
        }
        self.objects.lock().push(object);
        Ok(())
    }

    async fn create_object_from_item(&self, user_id: Uuid, item_id: Uuid) -> bool {
        self.record(SceneCall::CreateObjectFromItem { user_id, item_id });
        true
    }

    async fn delete_object(&self, object_id: Uuid) -> bool {
        self.record(SceneCall::DeleteObject(object_id));
        let mut objects = self.objects.lock();
        let before = objects.len();
        objects.retain(|o| o.id != object_id);
        objects.len() != before
    }

    async fn reload_estate_settings(&self) -> bool {
        self.record(SceneCall::ReloadEstateSettings);
        true
    }

    async fn wait_scene_presence(&self, agent_id: Uuid, max_wait: Duration) -> bool {
        self.record(SceneCall::WaitScenePresence(agent_id));
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            if self.present.lock().contains(&agent_id) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
