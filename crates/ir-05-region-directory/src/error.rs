//! Directory error types.

use shared_types::RegionHandle;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors from a region directory lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("Region {0} not found")]
    HandleNotFound(RegionHandle),

    #[error("Region {0} not found")]
    IdNotFound(Uuid),

    #[error("Directory lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}
