//! # Entity Paths
//!
//! Every peer call addresses its target as
//! `/{kind}/{entity_uuid}/{region_handle}/{action}/`, where the handle and
//! action segments are optional.

use crate::entities::RegionHandle;
use crate::errors::PathError;
use std::fmt;
use uuid::Uuid;

/// Parsed `/{kind}/{id}/{handle}/{action}` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPath {
    /// Resource kind: `agent`, `object`, `agent2`, `object2`, `region`.
    pub kind: String,
    pub id: Uuid,
    pub region_handle: Option<RegionHandle>,
    /// Empty when absent.
    pub action: String,
}

impl EntityPath {
    #[must_use]
    pub fn new(kind: &str, id: Uuid, region_handle: Option<RegionHandle>, action: &str) -> Self {
        Self {
            kind: kind.to_string(),
            id,
            region_handle,
            action: action.to_string(),
        }
    }

    /// Parse a request path.
    ///
    /// Leading and trailing slashes are ignored. The entity segment must be a
    /// UUID and a present handle segment must be a decimal `u64`.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let trimmed = path.trim_matches('/');
        let mut parts = trimmed.split('/');

        let kind = parts.next().unwrap_or_default().to_string();
        let entity = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PathError::MissingEntity(path.to_string()))?;
        let id = Uuid::parse_str(entity).map_err(|_| PathError::InvalidEntityId(entity.to_string()))?;

        let region_handle = match parts.next() {
            None | Some("") => None,
            Some(segment) => Some(
                segment
                    .parse::<RegionHandle>()
                    .map_err(|_| PathError::InvalidRegionHandle(segment.to_string()))?,
            ),
        };

        let action = parts.next().unwrap_or_default().to_string();

        Ok(Self {
            kind,
            id,
            region_handle,
            action,
        })
    }

    /// Handle segment, or the zero handle when absent.
    #[must_use]
    pub fn handle_or_default(&self) -> RegionHandle {
        self.region_handle.unwrap_or_default()
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/", self.kind, self.id)?;
        if let Some(handle) = self.region_handle {
            write!(f, "{handle}/")?;
            if !self.action.is_empty() {
                write!(f, "{}/", self.action)?;
            }
        }
        Ok(())
    }
}
