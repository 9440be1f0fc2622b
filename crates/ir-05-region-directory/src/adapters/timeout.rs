//! Deadline decorator for any directory.

use crate::error::DirectoryError;
use crate::ports::RegionDirectory;
use async_trait::async_trait;
use shared_types::{RegionEndpoint, RegionHandle};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Default lookup deadline.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounds every lookup of the inner directory by a deadline.
pub struct TimeoutDirectory<D> {
    inner: D,
    timeout: Duration,
}

impl<D: RegionDirectory> TimeoutDirectory<D> {
    pub fn new(inner: D, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: RegionDirectory> RegionDirectory for TimeoutDirectory<D> {
    async fn lookup_handle(&self, handle: RegionHandle) -> Result<RegionEndpoint, DirectoryError> {
        match tokio::time::timeout(self.timeout, self.inner.lookup_handle(handle)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(region_handle = %handle, timeout_ms = self.timeout.as_millis() as u64, "Directory lookup timed out");
                Err(DirectoryError::Timeout(self.timeout))
            }
        }
    }

    async fn lookup_id(&self, region_id: Uuid) -> Result<RegionEndpoint, DirectoryError> {
        match tokio::time::timeout(self.timeout, self.inner.lookup_id(region_id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%region_id, timeout_ms = self.timeout.as_millis() as u64, "Directory lookup timed out");
                Err(DirectoryError::Timeout(self.timeout))
            }
        }
    }
}
