//! Placement requests.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A request to place one rectangular item.
///
/// Extents are expected to be positive whole numbers in the same linear unit
/// as the pallet bounds. Requests are plain values; validation happens when
/// they are submitted to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaceRequest {
    /// Extent along x.
    pub width: f64,
    /// Extent along z.
    pub depth: f64,
    /// Extent along y (vertical).
    pub height: f64,
}

impl PlaceRequest {
    /// Creates a new request.
    pub fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// Requested extents as (width, depth, height).
    pub fn extents(&self) -> Vector3<f64> {
        Vector3::new(self.width, self.depth, self.height)
    }

    /// Plan-view area in requested (pre-orientation) units.
    pub fn footprint_area(&self) -> f64 {
        self.width * self.depth
    }

    /// Volume of the item.
    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// Returns true if every extent is a finite, positive whole number.
    pub fn has_valid_extents(&self) -> bool {
        [self.width, self.depth, self.height]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0 && v.fract() == 0.0)
    }
}

impl From<(f64, f64, f64)> for PlaceRequest {
    fn from((width, depth, height): (f64, f64, f64)) -> Self {
        Self::new(width, depth, height)
    }
}
