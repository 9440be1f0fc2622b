//! # Inbound Peer Surface
//!
//! HTTP handlers for calls from peer region hosts. Every request passes the
//! peer authenticator, has its path parsed into `{id, handle, action}`, has
//! its body decoded per generation, and is delivered to the local dispatch
//! backend.
//!
//! | Path | Generation | Verbs |
//! |------|------------|-------|
//! | `/agent/`   | legacy | GET, POST, PUT, DELETE |
//! | `/object/`  | legacy | POST, PUT |
//! | `/region/`  | legacy | POST (`UpdateEstateInfo`) |
//! | `/agent2/`  | binary | GET, PUT |
//! | `/object2/` | binary | POST, DELETE |
//! | `/health`   | -      | GET, unauthenticated |

mod agent;
mod object;
mod region;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use ir_01_peer_auth::{PeerAuthConfig, PeerAuthLayer};
use ir_02_nonce_ledger::NonceLedger;
use ir_03_local_dispatch::LocalDispatch;
use shared_types::wire::binary::MAX_FRAME_LEN;
use shared_types::{CrossingNonce, DispatchOutcome, DispatchResult, ObjectCodec, OutcomeExt, NONCE_HEADER};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower_http::trace::TraceLayer;

/// Shared state of the inbound handlers.
#[derive(Clone)]
pub struct InboundState {
    local: Arc<LocalDispatch>,
    ledger: Arc<NonceLedger>,
    codec: Arc<dyn ObjectCodec>,
}

impl InboundState {
    pub fn new(local: Arc<LocalDispatch>, ledger: Arc<NonceLedger>, codec: Arc<dyn ObjectCodec>) -> Self {
        Self { local, ledger, codec }
    }

    pub fn ledger(&self) -> &Arc<NonceLedger> {
        &self.ledger
    }
}

/// Build the peer-facing router.
pub fn router(state: InboundState, auth: PeerAuthConfig) -> Router {
    Router::new()
        .route("/agent/*path", any(agent::legacy))
        .route("/agent2/*path", any(agent::binary))
        .route("/object/*path", any(object::legacy))
        .route("/object2/*path", any(object::binary))
        .route("/region/*path", any(region::estate))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_FRAME_LEN + 4))
        .layer(PeerAuthLayer::new(auth))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Status for an operation outcome.
fn outcome_status<T>(outcome: &DispatchOutcome<T>) -> StatusCode {
    match outcome.result() {
        DispatchResult::Ok => StatusCode::OK,
        DispatchResult::AccessDenied => StatusCode::FORBIDDEN,
        DispatchResult::NotFound => StatusCode::NOT_FOUND,
        DispatchResult::MethodUnavailable => StatusCode::METHOD_NOT_ALLOWED,
        DispatchResult::Error => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn bad_request(reason: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, reason.into()).into_response()
}

fn nonce_from(headers: &HeaderMap) -> Option<CrossingNonce> {
    headers
        .get(NONCE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(CrossingNonce::from_header)
}

/// Local receipt tick in milliseconds.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
