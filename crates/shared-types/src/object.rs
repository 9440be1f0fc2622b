//! # Scene Objects
//!
//! The object graph itself is owned by the scene. What crosses a region
//! boundary is an [`ObjectSnapshot`]: opaque bytes produced by an
//! [`ObjectCodec`] once per crossing attempt.

use crate::entities::{CrossingNonce, Quaternion, Vector3};
use crate::errors::WireError;
use crate::wire::base64_bytes;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scene object group as handed between regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub position: Vector3,
    #[serde(default)]
    pub rotation: Quaternion,
    #[serde(default)]
    pub velocity: Vector3,
    #[serde(default)]
    pub is_attachment: bool,

    #[serde(default, with = "base64_bytes")]
    pub geometry: Vec<u8>,
    #[serde(default, with = "base64_bytes")]
    pub script_bytecode: Vec<u8>,
    #[serde(default, with = "base64_bytes")]
    pub physics_shape: Vec<u8>,
    /// Live script state; empty when the object carries none.
    #[serde(default, with = "base64_bytes")]
    pub state: Vec<u8>,

    // Receiver-local fields, stamped on arrival and never sent.
    /// Position the object arrived with before any override was applied.
    #[serde(skip)]
    pub original_entering_position: Option<Vector3>,
    /// Millisecond tick of receipt, used for motion interpolation.
    #[serde(skip)]
    pub time_received: Option<u64>,
    #[serde(skip)]
    pub nonce: Option<CrossingNonce>,
    /// Seated avatars the destination should wait for.
    #[serde(skip)]
    pub avatars_to_expect: u32,
}

impl SceneObject {
    #[must_use]
    pub fn new(id: Uuid, name: impl Into<String>, owner_id: Uuid, position: Vector3) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id,
            position,
            rotation: Quaternion::IDENTITY,
            velocity: Vector3::ZERO,
            is_attachment: false,
            geometry: Vec::new(),
            script_bytecode: Vec::new(),
            physics_shape: Vec::new(),
            state: Vec::new(),
            original_entering_position: None,
            time_received: None,
            nonce: None,
            avatars_to_expect: 0,
        }
    }

    #[must_use]
    pub fn has_state(&self) -> bool {
        !self.state.is_empty()
    }

    /// Re-express the object in the destination region's frame.
    pub fn offset_for_new_region(&mut self, position_in_destination: Vector3) {
        self.position = position_in_destination;
    }
}

/// Serialized scene object. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSnapshot(Bytes);

impl ObjectSnapshot {
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

/// Avatars travelling with an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RideAlong {
    /// Explicit list of seated avatars.
    Avatars(Vec<Uuid>),
    /// Only the number of avatars to expect is known.
    Count(u32),
}

impl RideAlong {
    /// Number of avatars the destination should wait for.
    #[must_use]
    pub fn expected(&self) -> u32 {
        match self {
            RideAlong::Avatars(ids) => u32::try_from(ids.len()).unwrap_or(u32::MAX),
            RideAlong::Count(n) => *n,
        }
    }

    /// Seated avatar ids; empty when only a count is known.
    #[must_use]
    pub fn avatar_ids(&self) -> &[Uuid] {
        match self {
            RideAlong::Avatars(ids) => ids,
            RideAlong::Count(_) => &[],
        }
    }
}

impl Default for RideAlong {
    fn default() -> Self {
        RideAlong::Count(0)
    }
}

/// Serialization engine for scene objects.
pub trait ObjectCodec: Send + Sync {
    /// Produce the snapshot sent for one crossing attempt.
    fn encode(&self, object: &SceneObject) -> Result<ObjectSnapshot, WireError>;

    /// Rebuild an object from a received snapshot.
    fn decode(&self, snapshot: &ObjectSnapshot) -> Result<SceneObject, WireError>;
}

/// [`ObjectCodec`] backed by bincode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeObjectCodec;

impl ObjectCodec for BincodeObjectCodec {
    fn encode(&self, object: &SceneObject) -> Result<ObjectSnapshot, WireError> {
        bincode::serialize(object)
            .map(ObjectSnapshot::new)
            .map_err(|e| WireError::Encode(e.to_string()))
    }

    fn decode(&self, snapshot: &ObjectSnapshot) -> Result<SceneObject, WireError> {
        Ok(bincode::deserialize(snapshot.as_bytes())?)
    }
}
