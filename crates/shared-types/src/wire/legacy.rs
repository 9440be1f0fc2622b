//! Legacy generation: JSON structured maps over plain HTTP verbs.
//!
//! Region handles travel as decimal strings; readers also accept numbers.
//! Replies to update and delete calls are the bare words `True`/`False`.

use crate::agent::{AgentCircuit, AgentData, AgentPosition};
use crate::entities::{RegionHandle, Vector3};
use crate::errors::WireError;
use crate::wire::base64_bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// String-keyed body of a legacy call.
pub type StructuredMap = Map<String, Value>;

pub const KEY_DESTINATION: &str = "destination_handle";
pub const KEY_AUTHORIZE: &str = "authorize_user";
pub const KEY_MESSAGE_TYPE: &str = "message_type";

/// Parse a request or reply body into a map.
pub fn parse_map(body: &str) -> Result<StructuredMap, WireError> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        other => Err(WireError::Malformed(format!("expected a JSON object, got {other}"))),
    }
}

/// Pack a struct into a map.
pub fn pack<T: Serialize>(value: &T) -> Result<StructuredMap, WireError> {
    match serde_json::to_value(value).map_err(|e| WireError::Encode(e.to_string()))? {
        Value::Object(map) => Ok(map),
        _ => Err(WireError::Encode("value does not pack into a map".into())),
    }
}

/// Unpack a struct from a map. Unknown keys are ignored.
pub fn unpack<T: DeserializeOwned>(map: StructuredMap) -> Result<T, WireError> {
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Read a region handle stored as a decimal string or a number.
#[must_use]
pub fn read_handle(map: &StructuredMap, key: &str) -> Option<RegionHandle> {
    match map.get(key)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64().map(RegionHandle),
        _ => None,
    }
}

fn read_bool(map: &StructuredMap, key: &str) -> bool {
    match map.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// `True` or `False`.
#[must_use]
pub fn bool_reply(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Interpret a bare boolean reply; anything unrecognised is `false`.
#[must_use]
pub fn parse_bool_reply(body: &str) -> bool {
    body.trim().trim_matches('"').eq_ignore_ascii_case("true")
}

/// Whether a reply is an explicit `False`. Unlike [`parse_bool_reply`], an
/// empty or free-text body is not a refusal.
#[must_use]
pub fn parse_false_reply(body: &str) -> bool {
    body.trim().trim_matches('"').eq_ignore_ascii_case("false")
}

// =============================================================================
// CREATE CHILD AGENT (POST /agent/{id}/)
// =============================================================================

/// Body of a legacy create-child-agent call.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAgentRequest {
    pub destination: RegionHandle,
    pub authorize_user: bool,
    pub circuit: AgentCircuit,
}

impl CreateAgentRequest {
    pub fn to_map(&self) -> Result<StructuredMap, WireError> {
        let mut map = pack(&self.circuit)?;
        map.insert(KEY_DESTINATION.into(), Value::String(self.destination.to_string()));
        map.insert(KEY_AUTHORIZE.into(), Value::Bool(self.authorize_user));
        Ok(map)
    }

    pub fn from_map(map: StructuredMap) -> Result<Self, WireError> {
        let destination = read_handle(&map, KEY_DESTINATION).unwrap_or_default();
        let authorize_user = read_bool(&map, KEY_AUTHORIZE);
        let circuit = unpack(map)?;
        Ok(Self {
            destination,
            authorize_user,
            circuit,
        })
    }
}

/// Reply to a legacy create-child-agent call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAgentReply {
    pub success: bool,
    #[serde(default)]
    pub reason: String,
    /// Refusal came from destination policy rather than a failure.
    #[serde(default)]
    pub denied: bool,
}

impl CreateAgentReply {
    /// Parse a reply, accepting the bare `true` older peers send.
    pub fn parse(body: &str) -> Result<Self, WireError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(WireError::Malformed("empty reply".into()));
        }
        match serde_json::from_str::<Self>(trimmed) {
            Ok(reply) => Ok(reply),
            Err(_) if parse_bool_reply(trimmed) => Ok(Self {
                success: true,
                reason: String::new(),
                denied: false,
            }),
            Err(e) => Err(WireError::Malformed(e.to_string())),
        }
    }
}

// =============================================================================
// CHILD AGENT UPDATE (PUT /agent/{id}/)
// =============================================================================

/// Agent update carried by a legacy PUT, tagged by `message_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentUpdate {
    Full(AgentData),
    Position(AgentPosition),
}

impl AgentUpdate {
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            AgentUpdate::Full(_) => "AgentData",
            AgentUpdate::Position(_) => "AgentPosition",
        }
    }

    #[must_use]
    pub fn agent_id(&self) -> Uuid {
        match self {
            AgentUpdate::Full(data) => data.agent_id,
            AgentUpdate::Position(pos) => pos.agent_id,
        }
    }
}

/// Decoded legacy PUT body.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentUpdateRequest {
    pub destination: RegionHandle,
    pub update: AgentUpdate,
    /// False when the sender omitted `message_type` and `AgentData` was assumed.
    pub message_type_present: bool,
}

impl AgentUpdateRequest {
    pub fn to_map(destination: RegionHandle, update: &AgentUpdate) -> Result<StructuredMap, WireError> {
        let mut map = match update {
            AgentUpdate::Full(data) => pack(data)?,
            AgentUpdate::Position(pos) => pack(pos)?,
        };
        map.insert(KEY_DESTINATION.into(), Value::String(destination.to_string()));
        map.insert(KEY_MESSAGE_TYPE.into(), Value::String(update.message_type().into()));
        Ok(map)
    }

    pub fn from_map(map: StructuredMap) -> Result<Self, WireError> {
        let destination = read_handle(&map, KEY_DESTINATION).unwrap_or_default();
        let message_type = map.get(KEY_MESSAGE_TYPE).and_then(Value::as_str).map(str::to_owned);
        let message_type_present = message_type.is_some();

        let update = match message_type.as_deref().unwrap_or("AgentData") {
            "AgentData" => AgentUpdate::Full(unpack(map)?),
            "AgentPosition" => AgentUpdate::Position(unpack(map)?),
            other => return Err(WireError::Malformed(format!("unknown message_type {other}"))),
        };

        Ok(Self {
            destination,
            update,
            message_type_present,
        })
    }
}

// =============================================================================
// OBJECTS (POST/PUT /object/{id}/{handle}/)
// =============================================================================

/// Legacy object create carrying the whole snapshot in the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyObjectPost {
    #[serde(with = "base64_bytes")]
    pub sog: Vec<u8>,
    #[serde(default)]
    pub pos: Option<Vector3>,
    /// Number of seated avatars to expect.
    #[serde(default)]
    pub avatars: Option<u32>,
}

/// Create an object from an inventory item both hosts can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectByReference {
    pub userid: Uuid,
    pub itemid: Uuid,
}

// =============================================================================
// ESTATE SYNC (POST /region/{region_id}/{handle}/UpdateEstateInfo/)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstateInfoRequest {
    pub region_id: Uuid,
}
