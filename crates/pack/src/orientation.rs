//! Orientation candidates for an item.

use std::collections::HashSet;
use u_pallet_core::{Orientation, OrientationMode, PlaceRequest};

/// Decimal places used when comparing oriented extents for duplicates.
const DEDUP_PRECISION: f64 = 1e6;

/// Enumerates the distinct axis assignments to try for a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrientationResolver {
    mode: OrientationMode,
}

impl OrientationResolver {
    /// Creates a resolver for the given mode.
    pub fn new(mode: OrientationMode) -> Self {
        Self { mode }
    }

    /// Orientations in the order they should be tried.
    ///
    /// Permutations producing the same extents (after rounding to six
    /// decimals) are listed once, at their first occurrence.
    pub fn resolve(&self, request: &PlaceRequest) -> Vec<Orientation> {
        let extents = request.extents();
        let mut seen = HashSet::new();

        self.mode
            .permutations()
            .iter()
            .enumerate()
            .map(|(index, axes)| Orientation::from_axes(index, *axes, &extents))
            .filter(|o| {
                let key = [o.width(), o.depth(), o.height()]
                    .map(|v| (v * DEDUP_PRECISION).round() as i64);
                seen.insert(key)
            })
            .collect()
    }
}
