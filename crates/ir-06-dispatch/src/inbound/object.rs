//! `/object/` and `/object2/` handlers.
//!
//! The binary create is where crossing duplicates are suppressed: a create
//! whose nonce the ledger already holds answers 204 and creates nothing.

use super::{bad_request, nonce_from, now_millis, outcome_status, InboundState};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use ir_03_local_dispatch::{Crossing, Local};
use shared_types::wire::binary::{decode_frame, ObjectPostMessage};
use shared_types::wire::legacy::{bool_reply, LegacyObjectPost, ObjectByReference};
use shared_types::{
    CrossingNonce, EntityPath, ObjectSnapshot, RegionHandle, RideAlong, SceneObject, Vector3,
};
use tracing::{debug, info, warn};

// =============================================================================
// BINARY
// =============================================================================

pub(super) async fn binary(
    State(state): State<InboundState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = match EntityPath::parse(uri.path()) {
        Ok(path) => path,
        Err(e) => return bad_request(e.to_string()),
    };
    let Some(nonce) = nonce_from(&headers) else {
        return bad_request(format!("missing or invalid {}", shared_types::NONCE_HEADER));
    };

    match method {
        Method::POST => create_object(&state, &path, nonce, &body).await,
        Method::DELETE => delete_object(&state, &path, nonce).await,
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn create_object(state: &InboundState, path: &EntityPath, nonce: CrossingNonce, body: &[u8]) -> Response {
    let message: ObjectPostMessage = match decode_frame(body) {
        Ok(message) => message,
        Err(e) => {
            warn!(object_id = %path.id, error = %e, "Undecodable object2 body");
            return bad_request(e.to_string());
        }
    };

    if state.ledger.contains(nonce) {
        info!(object_id = %path.id, nonce = nonce.0, "Suppressed create for cancelled crossing");
        return StatusCode::NO_CONTENT.into_response();
    }

    let mut object = match state.codec.decode(&message.snapshot()) {
        Ok(object) => object,
        Err(e) => {
            warn!(object_id = %path.id, error = %e, "Undecodable scene object");
            return bad_request(format!("bad object snapshot: {e}"));
        }
    };
    object.nonce = Some(nonce);
    let ride_along = message.ride_along();

    let outcome = receive_object(state, path.handle_or_default(), object, message.pos, &ride_along).await;
    match outcome {
        Local::Handled(result) => (outcome_status(&result), result.err().map(|e| e.reason).unwrap_or_default()).into_response(),
        Local::NotLocal => (StatusCode::NOT_FOUND, "region not found").into_response(),
    }
}

/// Receiver-side preparation shared by both generations: receipt stamp,
/// position override and expected passengers.
async fn receive_object(
    state: &InboundState,
    handle: RegionHandle,
    mut object: SceneObject,
    position: Option<Vector3>,
    ride_along: &RideAlong,
) -> Local<shared_types::DispatchOutcome> {
    object.time_received = Some(now_millis());
    if let Some(position) = position {
        object.original_entering_position = Some(object.position);
        object.position = position.clamp_to_region();
    }
    object.avatars_to_expect = ride_along.expected();

    debug!(object_id = %object.id, region_handle = %handle, expected = object.avatars_to_expect, "Object arriving");
    state.local.create_object(handle, &object, ride_along, Crossing::Wire).await
}

/// Remember the nonce before anything else, so a create that arrives after
/// this delete is suppressed even when no object is found now.
async fn delete_object(state: &InboundState, path: &EntityPath, nonce: CrossingNonce) -> Response {
    state.ledger.remember_for_retention(nonce);

    match state.local.delete_object(path.handle_or_default(), path.id).await {
        Local::Handled(Ok(())) => StatusCode::OK.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

// =============================================================================
// LEGACY
// =============================================================================

pub(super) async fn legacy(State(state): State<InboundState>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = match EntityPath::parse(uri.path()) {
        Ok(path) => path,
        Err(e) => return bad_request(e.to_string()),
    };

    match method {
        Method::POST => create_object_legacy(&state, &path, &body).await,
        Method::PUT => create_object_from_item(&state, &path, &body).await,
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn create_object_legacy(state: &InboundState, path: &EntityPath, body: &[u8]) -> Response {
    let post: LegacyObjectPost = match serde_json::from_slice(body) {
        Ok(post) => post,
        Err(e) => return bad_request(format!("bad object body: {e}")),
    };
    let object = match state.codec.decode(&ObjectSnapshot::new(post.sog)) {
        Ok(object) => object,
        Err(e) => return bad_request(format!("bad object snapshot: {e}")),
    };
    let ride_along = RideAlong::Count(post.avatars.unwrap_or(0));

    let outcome = receive_object(state, path.handle_or_default(), object, post.pos, &ride_along).await;
    bool_reply(matches!(outcome, Local::Handled(Ok(())))).into_response()
}

async fn create_object_from_item(state: &InboundState, path: &EntityPath, body: &[u8]) -> Response {
    let reference: ObjectByReference = match serde_json::from_slice(body) {
        Ok(reference) => reference,
        Err(e) => return bad_request(format!("bad item reference: {e}")),
    };

    let outcome = state
        .local
        .create_object_from_item(path.handle_or_default(), reference.userid, reference.itemid)
        .await;
    bool_reply(matches!(outcome, Local::Handled(Ok(())))).into_response()
}
