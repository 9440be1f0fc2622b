//! `/agent/` and `/agent2/` handlers.

use super::{bad_request, now_millis, InboundState};
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use ir_03_local_dispatch::Local;
use ir_04_transport::timeouts;
use shared_types::wire::binary::{decode_frame, AgentPutMessage};
use shared_types::wire::legacy::{
    bool_reply, parse_map, AgentUpdate, AgentUpdateRequest, CreateAgentReply, CreateAgentRequest,
};
use shared_types::{DispatchResult, EntityPath};
use tracing::{debug, info, warn};

// =============================================================================
// LEGACY
// =============================================================================

pub(super) async fn legacy(State(state): State<InboundState>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = match EntityPath::parse(uri.path()) {
        Ok(path) => path,
        Err(e) => {
            debug!(path = uri.path(), error = %e, "Unparseable agent path");
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };

    match method {
        Method::GET => retrieve_root_agent(&state, &path).await,
        Method::POST => create_child_agent(&state, &body).await,
        Method::PUT => update_child_agent(&state, &path, &body).await,
        Method::DELETE => delete_agent(&state, &path).await,
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn retrieve_root_agent(state: &InboundState, path: &EntityPath) -> Response {
    match state.local.retrieve_root_agent(path.handle_or_default(), path.id).await {
        Local::Handled(Ok(data)) => Json(data).into_response(),
        Local::Handled(Err(e)) => (StatusCode::NOT_FOUND, e.reason).into_response(),
        Local::NotLocal => (StatusCode::NOT_FOUND, "region not found").into_response(),
    }
}

async fn create_child_agent(state: &InboundState, body: &[u8]) -> Response {
    let request = match parse_map(&String::from_utf8_lossy(body)).and_then(CreateAgentRequest::from_map) {
        Ok(request) => request,
        Err(e) => return bad_request(format!("bad create agent body: {e}")),
    };

    info!(
        agent_id = %request.circuit.agent_id,
        region_handle = %request.destination,
        child = request.circuit.child,
        "Create child agent request"
    );

    let reply = match state
        .local
        .create_child_agent(request.destination, request.circuit, request.authorize_user)
        .await
    {
        Local::Handled(Ok(())) => CreateAgentReply {
            success: true,
            reason: String::new(),
            denied: false,
        },
        Local::Handled(Err(e)) => CreateAgentReply {
            success: false,
            denied: e.kind == DispatchResult::AccessDenied,
            reason: e.reason,
        },
        Local::NotLocal => CreateAgentReply {
            success: false,
            reason: format!("region {} not found", request.destination),
            denied: false,
        },
    };
    Json(reply).into_response()
}

/// Continuous position stream; not logged per request.
async fn update_child_agent(state: &InboundState, path: &EntityPath, body: &[u8]) -> Response {
    let request = match parse_map(&String::from_utf8_lossy(body)).and_then(AgentUpdateRequest::from_map) {
        Ok(request) => request,
        Err(e) => return bad_request(format!("bad agent update body: {e}")),
    };
    if !request.message_type_present {
        warn!(agent_id = %request.update.agent_id(), "Agent update without message_type, assuming AgentData");
    }

    let handle = path.region_handle.unwrap_or(request.destination);
    let outcome = match request.update {
        AgentUpdate::Full(data) => state.local.child_agent_update(handle, data).await,
        AgentUpdate::Position(position) => state.local.child_agent_position(handle, position).await,
    };
    bool_reply(matches!(outcome, Local::Handled(Ok(())))).into_response()
}

async fn delete_agent(state: &InboundState, path: &EntityPath) -> Response {
    let handle = path.handle_or_default();
    let outcome = if path.action == "release" {
        state.local.release_agent(handle, path.id).await
    } else {
        debug!(agent_id = %path.id, region_handle = %handle, "Closing child agent");
        state.local.close_agent(handle, path.id).await
    };
    bool_reply(matches!(outcome, Local::Handled(Ok(())))).into_response()
}

// =============================================================================
// BINARY
// =============================================================================

pub(super) async fn binary(State(state): State<InboundState>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = match EntityPath::parse(uri.path()) {
        Ok(path) => path,
        Err(e) => return bad_request(e.to_string()),
    };

    match method {
        Method::PUT => update_child_agent2(&state, &path, &body).await,
        Method::GET => wait_scene_presence(&state, &path).await,
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// 404 is reserved for peers without this endpoint, so an unknown region
/// answers 500 here.
async fn update_child_agent2(state: &InboundState, path: &EntityPath, body: &[u8]) -> Response {
    let message: AgentPutMessage = match decode_frame(body) {
        Ok(message) => message,
        Err(e) => {
            warn!(agent_id = %path.id, error = %e, "Undecodable agent2 body");
            return bad_request(e.to_string());
        }
    };
    let mut data = message.into_agent_data();
    data.created_on = Some(now_millis());

    match state.local.child_agent_update2(path.handle_or_default(), data).await {
        Local::Handled(Ok(())) => StatusCode::OK.into_response(),
        Local::Handled(Err(e)) if e.kind == DispatchResult::AccessDenied => {
            (StatusCode::FORBIDDEN, e.reason).into_response()
        }
        Local::Handled(Err(e)) => (StatusCode::INTERNAL_SERVER_ERROR, e.reason).into_response(),
        Local::NotLocal => (StatusCode::INTERNAL_SERVER_ERROR, "region not found").into_response(),
    }
}

async fn wait_scene_presence(state: &InboundState, path: &EntityPath) -> Response {
    match state
        .local
        .wait_scene_presence(path.handle_or_default(), path.id, timeouts::PRESENCE_WAIT)
        .await
    {
        Local::Handled(Ok(())) => StatusCode::OK.into_response(),
        Local::Handled(Err(e)) => (StatusCode::INTERNAL_SERVER_ERROR, e.reason).into_response(),
        Local::NotLocal => (StatusCode::NOT_FOUND, "region not found").into_response(),
    }
}
