//! # Agent Entities
//!
//! Admission credentials and state snapshots for avatars crossing regions.
//!
//! - [`AgentCircuit`]: consumed once by create-child-agent.
//! - [`AgentData`]: full snapshot, pushed on update and pulled on retrieve.
//! - [`AgentPosition`]: position-only delta for the continuous update stream.

use crate::entities::{Quaternion, RegionHandle, Vector3};
use crate::wire::base64_bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Credentials needed to admit an avatar at a destination region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCircuit {
    pub agent_id: Uuid,
    pub session_id: Uuid,
    pub secure_session_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub circuit_code: u32,
    #[serde(default)]
    pub caps_path: String,
    /// Child placeholder rather than a root-bound connection.
    #[serde(default = "default_child")]
    pub child: bool,
    #[serde(default)]
    pub start_pos: Vector3,
    #[serde(default)]
    pub client_version: String,
}

fn default_child() -> bool {
    true
}

impl AgentCircuit {
    /// Circuit for a child presence with fresh session identifiers.
    #[must_use]
    pub fn child(agent_id: Uuid, first_name: &str, last_name: &str, circuit_code: u32) -> Self {
        Self {
            agent_id,
            session_id: Uuid::new_v4(),
            secure_session_id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            circuit_code,
            caps_path: String::new(),
            child: true,
            start_pos: Vector3::ZERO,
            client_version: String::new(),
        }
    }

    /// Display name, "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Full agent snapshot.
///
/// Pushed to neighbours while the avatar is a child presence there, and
/// pulled back from the destination when a teleport completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentData {
    pub agent_id: Uuid,
    pub session_id: Uuid,
    /// Region the snapshot was taken in.
    pub region_handle: RegionHandle,
    pub circuit_code: u32,

    pub position: Vector3,
    pub velocity: Vector3,
    pub center: Vector3,
    pub size: Vector3,
    pub at_axis: Vector3,
    pub left_axis: Vector3,
    pub up_axis: Vector3,
    #[serde(default)]
    pub changed_grid: bool,
    pub far: f32,
    pub aspect: f32,
    #[serde(default, with = "base64_bytes")]
    pub throttles: Vec<u8>,

    #[serde(default)]
    pub locomotion_state: u32,
    #[serde(default)]
    pub head_rotation: Quaternion,
    #[serde(default)]
    pub body_rotation: Quaternion,
    #[serde(default)]
    pub control_flags: u32,
    #[serde(default)]
    pub energy_level: f32,
    #[serde(default)]
    pub god_level: u8,
    #[serde(default)]
    pub always_run: bool,
    #[serde(default)]
    pub prey_agent: Uuid,
    #[serde(default)]
    pub agent_access: u8,
    #[serde(default)]
    pub active_group_id: Uuid,

    /// Serialized appearance (textures, visual params, wearables).
    #[serde(default, with = "base64_bytes")]
    pub appearance: Vec<u8>,

    /// Where the destination should send the release call.
    #[serde(default)]
    pub callback_uri: Option<String>,

    /// Receiver-local millisecond tick stamped on arrival; drives motion
    /// interpolation. Never trusted from the sender.
    #[serde(default)]
    pub created_on: Option<u64>,
}

impl AgentData {
    /// Snapshot with identity fields set and neutral motion state.
    #[must_use]
    pub fn new(agent_id: Uuid, session_id: Uuid, region_handle: RegionHandle) -> Self {
        Self {
            agent_id,
            session_id,
            region_handle,
            circuit_code: 0,
            position: Vector3::ZERO,
            velocity: Vector3::ZERO,
            center: Vector3::ZERO,
            size: Vector3::new(0.45, 0.6, 1.9),
            at_axis: Vector3::new(1.0, 0.0, 0.0),
            left_axis: Vector3::new(0.0, 1.0, 0.0),
            up_axis: Vector3::new(0.0, 0.0, 1.0),
            changed_grid: false,
            far: 128.0,
            aspect: 1.0,
            throttles: Vec::new(),
            locomotion_state: 0,
            head_rotation: Quaternion::IDENTITY,
            body_rotation: Quaternion::IDENTITY,
            control_flags: 0,
            energy_level: 0.0,
            god_level: 0,
            always_run: false,
            prey_agent: Uuid::nil(),
            agent_access: 0,
            active_group_id: Uuid::nil(),
            appearance: Vec::new(),
            callback_uri: None,
            created_on: None,
        }
    }
}

/// Position-only agent update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPosition {
    pub agent_id: Uuid,
    pub session_id: Uuid,
    pub region_handle: RegionHandle,
    pub circuit_code: u32,
    pub size: Vector3,
    pub position: Vector3,
    pub velocity: Vector3,
    pub center: Vector3,
    pub at_axis: Vector3,
    pub left_axis: Vector3,
    pub up_axis: Vector3,
    pub far: f32,
    #[serde(default)]
    pub changed_grid: bool,
    #[serde(default, with = "base64_bytes")]
    pub throttles: Vec<u8>,
}

impl From<&AgentData> for AgentPosition {
    fn from(data: &AgentData) -> Self {
        Self {
            agent_id: data.agent_id,
            session_id: data.session_id,
            region_handle: data.region_handle,
            circuit_code: data.circuit_code,
            size: data.size,
            position: data.position,
            velocity: data.velocity,
            center: data.center,
            at_axis: data.at_axis,
            left_axis: data.left_axis,
            up_axis: data.up_axis,
            far: data.far,
            changed_grid: data.changed_grid,
            throttles: data.throttles.clone(),
        }
    }
}
