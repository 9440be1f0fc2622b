//! Binary generation: length-prefixed bincode messages.
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┐
//! │ len: u32 BE  │ bincode body (len bytes)     │
//! └──────────────┴──────────────────────────────┘
//! ```
//!
//! The crossing nonce travels in the `x-nonce-id` header, not in the frame.

use crate::agent::AgentData;
use crate::entities::Vector3;
use crate::errors::WireError;
use crate::object::{ObjectSnapshot, RideAlong};
use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest accepted frame body.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

const PREFIX_LEN: usize = 4;

/// Frame a message.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Bytes, WireError> {
    let body = bincode::serialize(message).map_err(|e| WireError::Encode(e.to_string()))?;
    if body.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge {
            len: body.len(),
            limit: MAX_FRAME_LEN,
        });
    }
    let len = u32::try_from(body.len()).map_err(|e| WireError::Encode(e.to_string()))?;

    let mut buf = BytesMut::with_capacity(PREFIX_LEN + body.len());
    buf.put_u32(len);
    buf.extend_from_slice(&body);
    Ok(buf.freeze())
}

/// Decode exactly one framed message from `buf`.
pub fn decode_frame<T: DeserializeOwned>(buf: &[u8]) -> Result<T, WireError> {
    let prefix: [u8; PREFIX_LEN] = buf
        .get(..PREFIX_LEN)
        .and_then(|p| p.try_into().ok())
        .ok_or(WireError::Truncated {
            needed: PREFIX_LEN,
            available: buf.len(),
        })?;
    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge {
            len,
            limit: MAX_FRAME_LEN,
        });
    }

    let rest = &buf[PREFIX_LEN..];
    if rest.len() < len {
        return Err(WireError::Truncated {
            needed: PREFIX_LEN + len,
            available: buf.len(),
        });
    }
    if rest.len() > len {
        return Err(WireError::TrailingBytes(rest.len() - len));
    }

    Ok(bincode::deserialize(&rest[..len])?)
}

/// Body of `POST /object2/{id}/{handle}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPostMessage {
    /// Serialized scene object.
    pub sog: Vec<u8>,
    /// Position override in the destination's frame.
    pub pos: Option<Vector3>,
    /// Seated avatars; when absent `num_avatars` is used.
    pub avatars: Option<Vec<Uuid>>,
    pub num_avatars: u32,
}

impl ObjectPostMessage {
    #[must_use]
    pub fn new(snapshot: &ObjectSnapshot, pos: Option<Vector3>, ride_along: &RideAlong) -> Self {
        let (avatars, num_avatars) = match ride_along {
            RideAlong::Avatars(ids) => (Some(ids.clone()), ride_along.expected()),
            RideAlong::Count(n) => (None, *n),
        };
        Self {
            sog: snapshot.as_bytes().to_vec(),
            pos,
            avatars,
            num_avatars,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ObjectSnapshot {
        ObjectSnapshot::new(self.sog.clone())
    }

    #[must_use]
    pub fn ride_along(&self) -> RideAlong {
        match &self.avatars {
            Some(ids) => RideAlong::Avatars(ids.clone()),
            None => RideAlong::Count(self.num_avatars),
        }
    }
}

/// Body of `PUT /agent2/{id}/{handle}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPutMessage {
    pub agent: AgentData,
}

impl AgentPutMessage {
    /// Agent snapshot with any sender-side `created_on` discarded.
    #[must_use]
    pub fn into_agent_data(self) -> AgentData {
        let mut agent = self.agent;
        agent.created_on = None;
        agent
    }
}
