//! # Core Domain Entities
//!
//! Region addressing, geometry and the crossing nonce.
//!
//! ## Region handles
//!
//! A handle packs the region's world-space origin into one `u64`:
//!
//! ```text
//!  63                 32 31                  0
//! ┌─────────────────────┬─────────────────────┐
//! │   grid_x * 256      │   grid_y * 256      │
//! └─────────────────────┴─────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Width of one region in metres.
pub const REGION_SIZE: u32 = 256;

/// Largest grid coordinate whose world origin still fits in 32 bits.
pub const MAX_GRID_COORD: u32 = u32::MAX / REGION_SIZE;

/// Lowest valid altitude inside a region.
pub const MIN_ALTITUDE: f32 = -128.0;

/// Highest valid altitude inside a region.
pub const MAX_ALTITUDE: f32 = 10_000.0;

/// Name of the header carrying a crossing nonce.
pub const NONCE_HEADER: &str = "x-nonce-id";

// =============================================================================
// REGION ADDRESSING
// =============================================================================

/// 64-bit address of a region within one grid's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionHandle(pub u64);

impl RegionHandle {
    /// Build a handle from grid coordinates (region units, not metres).
    ///
    /// Coordinates above [`MAX_GRID_COORD`] do not fit and bleed into the
    /// other half of the handle; use [`Self::try_from_grid`] for untrusted
    /// input.
    #[must_use]
    pub fn from_grid(x: u32, y: u32) -> Self {
        let world_x = u64::from(x) * u64::from(REGION_SIZE);
        let world_y = u64::from(y) * u64::from(REGION_SIZE);
        Self((world_x << 32) | world_y)
    }

    /// Like [`Self::from_grid`], but `None` when either coordinate is
    /// above [`MAX_GRID_COORD`].
    #[must_use]
    pub fn try_from_grid(x: u32, y: u32) -> Option<Self> {
        (x <= MAX_GRID_COORD && y <= MAX_GRID_COORD).then(|| Self::from_grid(x, y))
    }

    /// Grid coordinates encoded in this handle.
    #[must_use]
    pub fn to_grid(self) -> (u32, u32) {
        let world_x = (self.0 >> 32) as u32;
        let world_y = (self.0 & 0xFFFF_FFFF) as u32;
        (world_x / REGION_SIZE, world_y / REGION_SIZE)
    }

    /// Raw handle value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RegionHandle {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl From<u64> for RegionHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Connectable address of a peer region.
///
/// Resolved through the region directory and held only for the duration of
/// one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEndpoint {
    /// Stable identifier of the region.
    pub region_id: Uuid,
    /// Grid address of the region.
    pub handle: RegionHandle,
    /// External host name or IP address.
    pub host: String,
    /// Port of the host's interregion HTTP surface.
    pub http_port: u16,
}

impl RegionEndpoint {
    /// `http://host:port` with no trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.http_port)
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Position or direction in region-local metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Clamp into the valid volume of a single region.
    ///
    /// X and Y stay strictly below the region edge so the point never
    /// resolves to the neighbouring region.
    #[must_use]
    pub fn clamp_to_region(self) -> Self {
        let max_xy = REGION_SIZE as f32 - 0.001;
        Self {
            x: clamp_finite(self.x, 0.0, max_xy),
            y: clamp_finite(self.y, 0.0, max_xy),
            z: clamp_finite(self.z, MIN_ALTITUDE, MAX_ALTITUDE),
        }
    }
}

fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Orientation as a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };
}

// =============================================================================
// CROSSING NONCE
// =============================================================================

/// Identifier of one crossing attempt.
///
/// Links an object create to its compensating delete. Unique per attempt,
/// not per object: retrying the same object yields a fresh nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrossingNonce(pub u64);

impl CrossingNonce {
    /// Parse the decimal value carried in the `x-nonce-id` header.
    #[must_use]
    pub fn from_header(value: &str) -> Option<Self> {
        value.trim().parse::<u64>().ok().map(Self)
    }

    /// Header value for this nonce.
    #[must_use]
    pub fn to_header(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for CrossingNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
