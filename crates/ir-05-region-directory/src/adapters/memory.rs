//! Static in-memory directory, filled from configuration or by tests.

use crate::error::DirectoryError;
use crate::ports::RegionDirectory;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{RegionEndpoint, RegionHandle};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Directory backed by a map of known endpoints.
#[derive(Default)]
pub struct InMemoryRegionDirectory {
    endpoints: RwLock<HashMap<RegionHandle, RegionEndpoint>>,
}

impl InMemoryRegionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoints(endpoints: impl IntoIterator<Item = RegionEndpoint>) -> Self {
        let directory = Self::new();
        for endpoint in endpoints {
            directory.insert(endpoint);
        }
        directory
    }

    /// Add or replace an endpoint.
    pub fn insert(&self, endpoint: RegionEndpoint) {
        debug!(region_handle = %endpoint.handle, host = %endpoint.host, port = endpoint.http_port, "Directory entry added");
        self.endpoints.write().insert(endpoint.handle, endpoint);
    }

    pub fn remove(&self, handle: RegionHandle) -> Option<RegionEndpoint> {
        self.endpoints.write().remove(&handle)
    }

    pub fn len(&self) -> usize {
        self.endpoints.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RegionDirectory for InMemoryRegionDirectory {
    async fn lookup_handle(&self, handle: RegionHandle) -> Result<RegionEndpoint, DirectoryError> {
        self.endpoints
            .read()
            .get(&handle)
            .cloned()
            .ok_or(DirectoryError::HandleNotFound(handle))
    }

    async fn lookup_id(&self, region_id: Uuid) -> Result<RegionEndpoint, DirectoryError> {
        self.endpoints
            .read()
            .values()
            .find(|e| e.region_id == region_id)
            .cloned()
            .ok_or(DirectoryError::IdNotFound(region_id))
    }
}
