//! # Driven Port
//!
//! Lookup service the dispatcher consults before any remote call.

use crate::error::DirectoryError;
use async_trait::async_trait;
use shared_types::{RegionEndpoint, RegionHandle};
use uuid::Uuid;

/// Resolves regions to connectable endpoints.
///
/// Implementations own their own timeouts; callers treat every lookup as
/// a potentially slow external call.
#[async_trait]
pub trait RegionDirectory: Send + Sync {
    /// Endpoint of the region at `handle`.
    async fn lookup_handle(&self, handle: RegionHandle) -> Result<RegionEndpoint, DirectoryError>;

    /// Endpoint of the region with `region_id`.
    async fn lookup_id(&self, region_id: Uuid) -> Result<RegionEndpoint, DirectoryError>;
}
