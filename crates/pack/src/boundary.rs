//! Pallet boundary.

use crate::spatial_index::Aabb3D;
use u_pallet_core::{Error, Rect2D, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed extents of the load-bearing pallet.
///
/// The pallet is centered on the origin in the x/z plane. Items rest on the
/// deck top at `deck_height` and may not rise above `max_height`, which is an
/// absolute elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PalletBounds {
    /// Extent along x.
    width: f64,
    /// Extent along z.
    depth: f64,
    /// Highest elevation any item may reach.
    max_height: f64,
    /// Elevation of the pallet top (deck thickness).
    deck_height: f64,
}

impl PalletBounds {
    /// Creates pallet bounds with the deck top at elevation zero.
    pub fn new(width: f64, depth: f64, max_height: f64) -> Self {
        Self {
            width,
            depth,
            max_height,
            deck_height: 0.0,
        }
    }

    /// Sets the pallet-top elevation.
    pub fn with_deck_height(mut self, deck_height: f64) -> Self {
        self.deck_height = deck_height;
        self
    }

    /// Returns the width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the depth.
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Returns the absolute height limit.
    pub fn max_height(&self) -> f64 {
        self.max_height
    }

    /// Returns the elevation items rest on when nothing is beneath them.
    pub fn pallet_top(&self) -> f64 {
        self.deck_height
    }

    /// Height available above the deck.
    pub fn usable_height(&self) -> f64 {
        self.max_height - self.deck_height
    }

    /// The whole deck surface as a footprint.
    pub fn surface(&self) -> Rect2D {
        Rect2D::from_center(0.0, 0.0, self.width, self.depth)
    }

    /// Usable volume above the deck.
    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.usable_height()
    }

    /// The usable space as a box.
    pub fn aabb(&self) -> Aabb3D {
        Aabb3D::from_footprint(&self.surface(), self.deck_height, self.usable_height())
    }

    /// Returns true if the footprint lies on the deck.
    pub fn contains_footprint(&self, footprint: &Rect2D, eps: f64) -> bool {
        self.surface().contains(footprint, eps)
    }

    /// Validates the bounds.
    pub fn validate(&self) -> Result<()> {
        let extents = [self.width, self.depth, self.max_height];
        if extents.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(Error::InvalidBoundary(format!(
                "All pallet extents must be positive, got {}x{}x{}",
                self.width, self.depth, self.max_height
            )));
        }

        if !self.deck_height.is_finite() || self.deck_height < 0.0 {
            return Err(Error::InvalidBoundary(format!(
                "Deck height must be non-negative, got {}",
                self.deck_height
            )));
        }

        if self.deck_height >= self.max_height {
            return Err(Error::InvalidBoundary(format!(
                "Deck height {} leaves no room below max height {}",
                self.deck_height, self.max_height
            )));
        }

        Ok(())
    }
}
