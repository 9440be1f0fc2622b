use thiserror::Error;

/// Failure to construct the transport. Per-call failures never surface here;
/// they are normalized into `DispatchError`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP client could not be built: {0}")]
    Build(#[from] reqwest::Error),
}
