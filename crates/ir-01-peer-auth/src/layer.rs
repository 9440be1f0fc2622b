//! Tower middleware enforcing the grid send key on inbound peer calls.
//!
//! Runs before routing, so an untrusted caller never reaches a handler and
//! no region state is read or mutated.

use crate::domain::GridSendKey;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderValue, Request, StatusCode},
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::warn;

/// Authenticator configuration
#[derive(Clone, Debug)]
pub struct PeerAuthConfig {
    pub key: GridSendKey,
    /// Paths served without a credential (operator probes).
    pub exempt_paths: Vec<String>,
}

impl PeerAuthConfig {
    pub fn new(key: GridSendKey) -> Self {
        Self {
            key,
            exempt_paths: vec!["/health".to_string()],
        }
    }

    /// Whether a request carries the grid credential.
    pub fn is_trusted<B>(&self, req: &Request<B>) -> bool {
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|presented| self.key.verify(presented))
            .unwrap_or(false)
    }

    fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| p == path)
    }
}

/// Authentication layer
#[derive(Clone)]
pub struct PeerAuthLayer {
    config: Arc<PeerAuthConfig>,
}

impl PeerAuthLayer {
    pub fn new(config: PeerAuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for PeerAuthLayer {
    type Service = PeerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PeerAuthService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct PeerAuthService<S> {
    inner: S,
    config: Arc<PeerAuthConfig>,
}

impl<S> Service<Request<Body>> for PeerAuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let config = Arc::clone(&self.config);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !config.is_exempt(req.uri().path()) && !config.is_trusted(&req) {
                warn!(
                    peer = %remote_addr(&req),
                    path = %req.uri().path(),
                    method = %req.method(),
                    "Interregion communication from untrusted peer"
                );
                return Ok(unauthorized_response());
            }

            inner.call(req).await
        })
    }
}

/// Caller address, when the server was started with connect info.
fn remote_addr<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Create unauthorized response
fn unauthorized_response() -> Response {
    let mut response = Response::new(Body::from("Untrusted"));
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
    response
}
