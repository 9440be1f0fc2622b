//! Loopback region hosts and scripted stub peers.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use ir_01_peer_auth::{GridSendKey, PeerAuthConfig};
use ir_02_nonce_ledger::test_utils::ManualTimeSource;
use ir_02_nonce_ledger::{NonceGenerator, NonceLedger, DEFAULT_RETENTION};
use ir_03_local_dispatch::{LocalDispatch, RecordingScene, RegionScene};
use ir_04_transport::{PeerTimeouts, RegionClient};
use ir_05_region_directory::InMemoryRegionDirectory;
use ir_06_dispatch::{router, InboundState, RegionDispatcher};
use parking_lot::Mutex;
use shared_types::{BincodeObjectCodec, RegionEndpoint, RegionHandle, NONCE_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const GRID_KEY: &str = "loopback-grid-key";

/// How a [`TestHost`] deviates from a well-behaved peer.
#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    /// Timeout table of the host's outbound client.
    pub timeouts: PeerTimeouts,
    /// Hold every inbound `/object2/` create this long before handling it.
    pub late_object_posts: Option<Duration>,
}

/// One region host serving its peer surface on loopback.
pub struct TestHost {
    pub addr: SocketAddr,
    pub local: Arc<LocalDispatch>,
    pub ledger: Arc<NonceLedger>,
    pub clock: Arc<ManualTimeSource>,
    pub directory: Arc<InMemoryRegionDirectory>,
    pub dispatcher: RegionDispatcher,
}

impl TestHost {
    pub async fn spawn() -> Self {
        Self::spawn_with_key(GRID_KEY).await
    }

    pub async fn spawn_with_key(key: &str) -> Self {
        Self::build(key, HostOptions::default()).await
    }

    pub async fn spawn_with(options: HostOptions) -> Self {
        Self::build(GRID_KEY, options).await
    }

    async fn build(key: &str, options: HostOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let key = GridSendKey::new(key);
        let local = Arc::new(LocalDispatch::new());
        let clock = Arc::new(ManualTimeSource::new());
        let ledger = Arc::new(NonceLedger::with_config(DEFAULT_RETENTION, clock.clone()));
        let codec = Arc::new(BincodeObjectCodec);
        let directory = Arc::new(InMemoryRegionDirectory::new());

        let dispatcher = RegionDispatcher::rest(
            local.clone(),
            directory.clone(),
            RegionClient::with_timeouts(&key, options.timeouts).unwrap(),
            codec.clone(),
        )
        .with_nonces(NonceGenerator::with_seed(addr.port().into()));

        let state = InboundState::new(local.clone(), ledger.clone(), codec);
        let mut app = router(state, PeerAuthConfig::new(key));
        if let Some(delay) = options.late_object_posts {
            app = app.layer(middleware::from_fn(move |request: Request, next: Next| {
                late_object_post(delay, request, next)
            }));
        }
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self {
            addr,
            local,
            ledger,
            clock,
            directory,
            dispatcher,
        }
    }

    /// Host a recording region at grid `(x, y)`.
    pub fn host_region(&self, x: u32, y: u32) -> Arc<RecordingScene> {
        let scene = Arc::new(RecordingScene::at_grid(x, y));
        self.local.register(scene.clone()).unwrap();
        scene
    }

    pub fn endpoint_of(&self, scene: &RecordingScene) -> RegionEndpoint {
        RegionEndpoint {
            region_id: scene.region_id(),
            handle: scene.region_handle(),
            host: "127.0.0.1".to_string(),
            http_port: self.addr.port(),
        }
    }

    /// Make `other`'s region resolvable from this host.
    pub fn learn(&self, other: &TestHost, scene: &RecordingScene) {
        self.directory.insert(other.endpoint_of(scene));
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Handle an object create after `delay`, finishing even if the sender
/// has already hung up.
async fn late_object_post(delay: Duration, request: Request, next: Next) -> Response {
    if request.method() != Method::POST || !request.uri().path().starts_with("/object2/") {
        return next.run(request).await;
    }
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    let request = Request::from_parts(parts, Body::from(body));
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        next.run(request).await
    })
    .await
    .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Two hosts that know each other's single region.
pub struct Pair {
    pub a: TestHost,
    pub b: TestHost,
    pub scene_a: Arc<RecordingScene>,
    pub scene_b: Arc<RecordingScene>,
}

impl Pair {
    pub fn handle_b(&self) -> RegionHandle {
        self.scene_b.region_handle()
    }

    pub fn endpoint_b(&self) -> RegionEndpoint {
        self.b.endpoint_of(&self.scene_b)
    }
}

pub async fn pair() -> Pair {
    let a = TestHost::spawn().await;
    let b = TestHost::spawn().await;
    let scene_a = a.host_region(1000, 1000);
    let scene_b = b.host_region(1001, 1000);
    a.learn(&b, &scene_b);
    b.learn(&a, &scene_a);
    Pair { a, b, scene_a, scene_b }
}

/// Client holding the grid key, for driving a peer directly.
pub fn client() -> RegionClient {
    RegionClient::new(&GridSendKey::new(GRID_KEY)).unwrap()
}

pub fn basic_auth() -> String {
    GridSendKey::new(GRID_KEY).authorization()
}

// =============================================================================
// Stub peer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub nonce: Option<String>,
    pub body_len: usize,
}

type Script = fn(&Method, &str) -> (StatusCode, &'static str);

#[derive(Clone)]
struct StubState {
    seen: Arc<Mutex<Vec<Seen>>>,
    script: Script,
}

/// Peer that answers from a script and records every request.
pub struct StubPeer {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl StubPeer {
    pub async fn spawn(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            seen: seen.clone(),
            script,
        };
        let app = Router::new().fallback(stub_handler).with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, seen }
    }

    pub fn endpoint(&self, handle: RegionHandle) -> RegionEndpoint {
        RegionEndpoint {
            region_id: uuid::Uuid::new_v4(),
            handle,
            host: "127.0.0.1".to_string(),
            http_port: self.addr.port(),
        }
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }
}

async fn stub_handler(State(state): State<StubState>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let path = uri.path().to_string();
    state.seen.lock().push(Seen {
        method: method.clone(),
        path: path.clone(),
        nonce: headers
            .get(NONCE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body_len: body.len(),
    });
    (state.script)(&method, &path)
}

/// An address nothing listens on.
pub async fn dead_endpoint(handle: RegionHandle) -> RegionEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    RegionEndpoint {
        region_id: uuid::Uuid::new_v4(),
        handle,
        host: "127.0.0.1".to_string(),
        http_port: port,
    }
}
