//! Outbound client for peer region hosts.

use crate::error::TransportError;
use crate::timeouts::PeerTimeouts;
use bytes::Bytes;
use ir_01_peer_auth::GridSendKey;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use shared_types::wire::binary::{encode_frame, AgentPutMessage, ObjectPostMessage};
use shared_types::wire::legacy::{
    parse_bool_reply, parse_false_reply, AgentUpdate, AgentUpdateRequest, CreateAgentReply, CreateAgentRequest,
    EstateInfoRequest, ObjectByReference,
};
use shared_types::{
    AgentCircuit, AgentData, AgentPosition, CrossingNonce, DispatchError, DispatchOutcome,
    DispatchResult, EntityPath, ObjectSnapshot, RegionEndpoint, RideAlong, Vector3,
    NONCE_HEADER,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

const JSON: &str = "application/json";
const BINARY: &str = "application/octet-stream";

enum Payload {
    Empty,
    Json(String),
    Binary(Bytes),
}

impl Payload {
    fn json(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self, DispatchError> {
        serde_json::to_string(map)
            .map(Payload::Json)
            .map_err(|e| DispatchError::error(format!("could not encode request: {e}")))
    }
}

/// One outbound call, fully described.
struct PeerCall<'a> {
    operation: &'static str,
    endpoint: &'a RegionEndpoint,
    method: Method,
    path: EntityPath,
    payload: Payload,
    nonce: Option<CrossingNonce>,
    timeout: Duration,
}

/// HTTP client shared by every outbound interregion call.
///
/// Holds one connection pool. Every call carries the grid credential and a
/// fixed timeout, and every failure comes back as a [`DispatchError`].
#[derive(Clone)]
pub struct RegionClient {
    http: Client,
    authorization: String,
    timeouts: PeerTimeouts,
}

impl RegionClient {
    /// Create a client presenting `key` to every peer, with the default
    /// timeout table.
    pub fn new(key: &GridSendKey) -> Result<Self, TransportError> {
        Self::with_timeouts(key, PeerTimeouts::default())
    }

    pub fn with_timeouts(key: &GridSendKey, timeouts: PeerTimeouts) -> Result<Self, TransportError> {
        let http = Client::builder().connect_timeout(timeouts.connect).build()?;

        Ok(Self {
            http,
            authorization: key.authorization(),
            timeouts,
        })
    }

    pub fn timeouts(&self) -> &PeerTimeouts {
        &self.timeouts
    }

    /// Send a call and normalize its outcome. Failures are logged here and
    /// nowhere else.
    async fn call(&self, call: PeerCall<'_>) -> DispatchOutcome<Bytes> {
        let PeerCall {
            operation,
            endpoint,
            method,
            path,
            payload,
            nonce,
            timeout,
        } = call;
        let peer = endpoint.base_url();
        let url = format!("{peer}{path}");

        let mut request = self
            .http
            .request(method, &url)
            .timeout(timeout)
            .header(AUTHORIZATION, &self.authorization);
        if let Some(nonce) = nonce {
            request = request.header(NONCE_HEADER, nonce.to_header());
        }
        request = match payload {
            Payload::Empty => request,
            Payload::Json(text) => request.header(CONTENT_TYPE, JSON).body(text),
            Payload::Binary(bytes) => request.header(CONTENT_TYPE, BINARY).body(bytes),
        };

        let started = Instant::now();
        let sent = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        }
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match sent {
            Ok((status, body)) => {
                debug!(operation, %peer, status = status.as_u16(), elapsed_ms, "Peer call completed");
                match DispatchResult::from_status(status.as_u16()) {
                    DispatchResult::Ok => Ok(body),
                    kind => {
                        info!(operation, %peer, %path, status = status.as_u16(), elapsed_ms, "Peer refused call");
                        Err(DispatchError::new(
                            kind,
                            format!("{operation} to {peer} returned {status}"),
                        ))
                    }
                }
            }
            Err(e) => {
                let reason = if e.is_timeout() {
                    format!("{operation} to {peer} timed out after {elapsed_ms}ms")
                } else if e.is_connect() {
                    format!("{operation} cannot connect to {peer}")
                } else {
                    format!("{operation} to {peer} failed: {e}")
                };
                warn!(operation, %peer, %path, elapsed_ms, error = %e, "Peer call failed");
                Err(DispatchError::error(reason))
            }
        }
    }

    // =========================================================================
    // AGENTS
    // =========================================================================

    /// `POST /agent/{id}/`: admit a child agent at the destination.
    pub async fn create_child_agent(
        &self,
        endpoint: &RegionEndpoint,
        circuit: &AgentCircuit,
        authorize_user: bool,
    ) -> DispatchOutcome {
        let request = CreateAgentRequest {
            destination: endpoint.handle,
            authorize_user,
            circuit: circuit.clone(),
        };
        let map = request
            .to_map()
            .map_err(|e| DispatchError::error(format!("could not encode agent circuit: {e}")))?;

        let body = self
            .call(PeerCall {
                operation: "create_child_agent",
                endpoint,
                method: Method::POST,
                path: EntityPath::new("agent", circuit.agent_id, None, ""),
                payload: Payload::json(&map)?,
                nonce: None,
                timeout: self.timeouts.query,
            })
            .await?;

        let reply = CreateAgentReply::parse(&String::from_utf8_lossy(&body))
            .map_err(|e| DispatchError::error(format!("unreadable create_child_agent reply: {e}")))?;
        match reply {
            CreateAgentReply { success: true, .. } => Ok(()),
            CreateAgentReply { denied: true, reason, .. } => Err(DispatchError::access_denied(reason)),
            CreateAgentReply { reason, .. } => Err(DispatchError::error(reason)),
        }
    }

    /// `PUT /agent/{id}/{handle}/` with a full snapshot.
    pub async fn child_agent_update(&self, endpoint: &RegionEndpoint, data: &AgentData) -> DispatchOutcome {
        self.put_agent_update(endpoint, AgentUpdate::Full(data.clone()), self.timeouts.agent_update)
            .await
    }

    /// `PUT /agent/{id}/{handle}/` with a position-only delta.
    pub async fn child_agent_position(&self, endpoint: &RegionEndpoint, position: &AgentPosition) -> DispatchOutcome {
        self.put_agent_update(endpoint, AgentUpdate::Position(position.clone()), self.timeouts.agent_position)
            .await
    }

    async fn put_agent_update(&self, endpoint: &RegionEndpoint, update: AgentUpdate, timeout: Duration) -> DispatchOutcome {
        let map = AgentUpdateRequest::to_map(endpoint.handle, &update)
            .map_err(|e| DispatchError::error(format!("could not encode agent update: {e}")))?;
        let operation = match update {
            AgentUpdate::Full(_) => "child_agent_update",
            AgentUpdate::Position(_) => "child_agent_position",
        };

        let body = self
            .call(PeerCall {
                operation,
                endpoint,
                method: Method::PUT,
                path: EntityPath::new("agent", update.agent_id(), Some(endpoint.handle), ""),
                payload: Payload::json(&map)?,
                nonce: None,
                timeout,
            })
            .await?;
        expect_true(operation, endpoint, &body)
    }

    /// `PUT /agent2/{id}/{handle}/`: binary full-state update.
    ///
    /// A peer without the binary generation answers 404, reported here as
    /// MethodUnavailable so the caller can fall back to the legacy PUT.
    pub async fn child_agent_update2(&self, endpoint: &RegionEndpoint, data: &AgentData) -> DispatchOutcome {
        let frame = encode_frame(&AgentPutMessage { agent: data.clone() })
            .map_err(|e| DispatchError::error(format!("could not encode agent: {e}")))?;

        self.call(PeerCall {
            operation: "child_agent_update2",
            endpoint,
            method: Method::PUT,
            path: EntityPath::new("agent2", data.agent_id, Some(endpoint.handle), ""),
            payload: Payload::Binary(frame),
            nonce: None,
            timeout: self.timeouts.agent_update,
        })
        .await
        .map(drop)
        .map_err(|e| match e.kind {
            DispatchResult::NotFound => DispatchError::method_unavailable(e.reason),
            _ => e,
        })
    }

    /// `GET /agent/{id}/{handle}/`: pull the full snapshot of a root agent.
    pub async fn retrieve_root_agent(&self, endpoint: &RegionEndpoint, agent_id: Uuid) -> DispatchOutcome<AgentData> {
        let body = self
            .call(PeerCall {
                operation: "retrieve_root_agent",
                endpoint,
                method: Method::GET,
                path: EntityPath::new("agent", agent_id, Some(endpoint.handle), ""),
                payload: Payload::Empty,
                nonce: None,
                timeout: self.timeouts.query,
            })
            .await?;

        serde_json::from_slice(&body)
            .map_err(|e| DispatchError::error(format!("unreadable agent snapshot from {}: {e}", endpoint.base_url())))
    }

    /// `DELETE /agent/{id}/{handle}/release/`: the origin may reclaim the agent.
    pub async fn release_agent(&self, endpoint: &RegionEndpoint, agent_id: Uuid) -> DispatchOutcome {
        let body = self
            .call(PeerCall {
                operation: "release_agent",
                endpoint,
                method: Method::DELETE,
                path: EntityPath::new("agent", agent_id, Some(endpoint.handle), "release"),
                payload: Payload::Empty,
                nonce: None,
                timeout: self.timeouts.query,
            })
            .await?;
        expect_agent_held("release_agent", endpoint, agent_id, &body)
    }

    /// `DELETE /agent/{id}/{handle}/`: terminate a child presence.
    pub async fn close_agent(&self, endpoint: &RegionEndpoint, agent_id: Uuid) -> DispatchOutcome {
        let body = self
            .call(PeerCall {
                operation: "close_agent",
                endpoint,
                method: Method::DELETE,
                path: EntityPath::new("agent", agent_id, Some(endpoint.handle), ""),
                payload: Payload::Empty,
                nonce: None,
                timeout: self.timeouts.query,
            })
            .await?;
        expect_agent_held("close_agent", endpoint, agent_id, &body)
    }

    /// `GET /agent2/{id}/{handle}/`: ask the destination to wait for the
    /// agent's presence to be established.
    pub async fn wait_scene_presence(&self, endpoint: &RegionEndpoint, agent_id: Uuid) -> DispatchOutcome {
        self.call(PeerCall {
            operation: "wait_scene_presence",
            endpoint,
            method: Method::GET,
            path: EntityPath::new("agent2", agent_id, Some(endpoint.handle), ""),
            payload: Payload::Empty,
            nonce: None,
            timeout: self.timeouts.wait_presence,
        })
        .await
        .map(drop)
    }

    // =========================================================================
    // OBJECTS
    // =========================================================================

    /// `POST /object2/{id}/{handle}/` carrying `nonce` in `x-nonce-id`.
    pub async fn create_object2(
        &self,
        endpoint: &RegionEndpoint,
        object_id: Uuid,
        snapshot: &ObjectSnapshot,
        position: Option<Vector3>,
        ride_along: &RideAlong,
        nonce: CrossingNonce,
    ) -> DispatchOutcome {
        let frame = encode_frame(&ObjectPostMessage::new(snapshot, position, ride_along))
            .map_err(|e| DispatchError::error(format!("could not frame object {object_id}: {e}")))?;

        self.call(PeerCall {
            operation: "create_object",
            endpoint,
            method: Method::POST,
            path: EntityPath::new("object2", object_id, Some(endpoint.handle), ""),
            payload: Payload::Binary(frame),
            nonce: Some(nonce),
            timeout: self.timeouts.create_object,
        })
        .await
        .map(drop)
    }

    /// `DELETE /object2/{id}/{handle}/`: compensating delete for a crossing
    /// attempt.
    pub async fn delete_object2(&self, endpoint: &RegionEndpoint, object_id: Uuid, nonce: CrossingNonce) -> DispatchOutcome {
        self.call(PeerCall {
            operation: "delete_object",
            endpoint,
            method: Method::DELETE,
            path: EntityPath::new("object2", object_id, Some(endpoint.handle), ""),
            payload: Payload::Empty,
            nonce: Some(nonce),
            timeout: self.timeouts.create_object,
        })
        .await
        .map(drop)
    }

    /// `PUT /object/{item}/{handle}/`: rez an inventory item both hosts can
    /// reach.
    pub async fn create_object_from_item(&self, endpoint: &RegionEndpoint, user_id: Uuid, item_id: Uuid) -> DispatchOutcome {
        let reference = ObjectByReference {
            userid: user_id,
            itemid: item_id,
        };
        let text = serde_json::to_string(&reference)
            .map_err(|e| DispatchError::error(format!("could not encode item reference: {e}")))?;

        let body = self
            .call(PeerCall {
                operation: "create_object_from_item",
                endpoint,
                method: Method::PUT,
                path: EntityPath::new("object", item_id, Some(endpoint.handle), ""),
                payload: Payload::Json(text),
                nonce: None,
                timeout: self.timeouts.query,
            })
            .await?;
        expect_true("create_object_from_item", endpoint, &body)
    }

    // =========================================================================
    // REGIONS
    // =========================================================================

    /// `POST /region/{region_id}/{handle}/UpdateEstateInfo/`.
    pub async fn update_estate_info(&self, endpoint: &RegionEndpoint) -> DispatchOutcome {
        let text = serde_json::to_string(&EstateInfoRequest {
            region_id: endpoint.region_id,
        })
        .map_err(|e| DispatchError::error(format!("could not encode estate request: {e}")))?;

        self.call(PeerCall {
            operation: "update_estate_info",
            endpoint,
            method: Method::POST,
            path: EntityPath::new("region", endpoint.region_id, Some(endpoint.handle), "UpdateEstateInfo"),
            payload: Payload::Json(text),
            nonce: None,
            timeout: self.timeouts.query,
        })
        .await
        .map(drop)
    }

    /// Lightweight reachability probe against `/health`.
    pub async fn is_reachable(&self, endpoint: &RegionEndpoint) -> bool {
        self.http
            .get(format!("{}/health", endpoint.base_url()))
            .timeout(self.timeouts.query)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

/// Legacy calls answer `True`/`False` with status 200.
fn expect_true(operation: &str, endpoint: &RegionEndpoint, body: &[u8]) -> DispatchOutcome {
    if parse_bool_reply(&String::from_utf8_lossy(body)) {
        Ok(())
    } else {
        debug!(operation, peer = %endpoint.base_url(), "Peer answered False");
        Err(DispatchError::error(format!("{operation} rejected by {}", endpoint.base_url())))
    }
}

/// Legacy agent DELETE answers 200 either way; `False` means the peer holds
/// no such agent. Older peers answer free text, which counts as done.
fn expect_agent_held(operation: &str, endpoint: &RegionEndpoint, agent_id: Uuid, body: &[u8]) -> DispatchOutcome {
    if parse_false_reply(&String::from_utf8_lossy(body)) {
        debug!(operation, peer = %endpoint.base_url(), %agent_id, "Peer does not hold agent");
        Err(DispatchError::not_found(format!(
            "agent {agent_id} not in region {} at {}",
            endpoint.handle,
            endpoint.base_url()
        )))
    } else {
        Ok(())
    }
}

impl std::fmt::Debug for RegionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionClient").finish_non_exhaustive()
    }
}
