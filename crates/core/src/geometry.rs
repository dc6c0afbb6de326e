//! Footprint and orientation geometry.
//!
//! The pallet plane is the x/z plane with y pointing up. Footprints are
//! axis-aligned rectangles described by their minimum corner and extents.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in the pallet plane.
///
/// Used both for free-space rectangles and for item footprints.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect2D {
    /// Minimum x coordinate.
    pub min_x: f64,
    /// Minimum z coordinate.
    pub min_z: f64,
    /// Extent along x.
    pub width: f64,
    /// Extent along z.
    pub depth: f64,
}

impl Rect2D {
    /// Creates a rectangle from its minimum corner and extents.
    pub fn new(min_x: f64, min_z: f64, width: f64, depth: f64) -> Self {
        Self {
            min_x,
            min_z,
            width,
            depth,
        }
    }

    /// Creates a rectangle from its center and extents.
    pub fn from_center(cx: f64, cz: f64, width: f64, depth: f64) -> Self {
        Self::new(cx - width / 2.0, cz - depth / 2.0, width, depth)
    }

    /// Creates a rectangle from its two corners.
    pub fn from_corners(min_x: f64, min_z: f64, max_x: f64, max_z: f64) -> Self {
        Self::new(min_x, min_z, max_x - min_x, max_z - min_z)
    }

    /// Maximum x coordinate.
    pub fn max_x(&self) -> f64 {
        self.min_x + self.width
    }

    /// Maximum z coordinate.
    pub fn max_z(&self) -> f64 {
        self.min_z + self.depth
    }

    /// Center of the rectangle as (x, z).
    pub fn center(&self) -> (f64, f64) {
        (
            self.min_x + self.width / 2.0,
            self.min_z + self.depth / 2.0,
        )
    }

    /// Area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width * self.depth
    }

    /// Returns true if an item of the given extents fits inside.
    pub fn fits(&self, width: f64, depth: f64, eps: f64) -> bool {
        self.width + eps >= width && self.depth + eps >= depth
    }

    /// Returns true if `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rect2D, eps: f64) -> bool {
        other.min_x >= self.min_x - eps
            && other.min_z >= self.min_z - eps
            && other.max_x() <= self.max_x() + eps
            && other.max_z() <= self.max_z() + eps
    }

    /// Returns true if the point lies inside or on the edge of this rectangle.
    pub fn contains_point(&self, x: f64, z: f64, eps: f64) -> bool {
        x >= self.min_x - eps
            && x <= self.max_x() + eps
            && z >= self.min_z - eps
            && z <= self.max_z() + eps
    }

    /// Returns the overlapping region, if both overlap extents exceed `eps`.
    ///
    /// Rectangles that merely touch along an edge do not overlap.
    pub fn intersection(&self, other: &Rect2D, eps: f64) -> Option<Rect2D> {
        let min_x = self.min_x.max(other.min_x);
        let min_z = self.min_z.max(other.min_z);
        let max_x = self.max_x().min(other.max_x());
        let max_z = self.max_z().min(other.max_z());

        if max_x - min_x > eps && max_z - min_z > eps {
            Some(Rect2D::from_corners(min_x, min_z, max_x, max_z))
        } else {
            None
        }
    }
}

/// Which axis assignments of an item's extents may be tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OrientationMode {
    /// Requested extents only.
    Fixed,
    /// Requested extents, then width and depth swapped. Items are never
    /// tipped onto a side.
    #[default]
    Upright,
    /// All distinct permutations of the three extents.
    Any,
}

impl OrientationMode {
    /// Axis permutations in the order they are tried.
    ///
    /// Each entry is (width_axis, depth_axis, height_axis) over the
    /// requested (width, depth, height).
    pub fn permutations(&self) -> &'static [(usize, usize, usize)] {
        match self {
            Self::Fixed => &[(0, 1, 2)],
            Self::Upright => &[(0, 1, 2), (1, 0, 2)],
            Self::Any => &[
                (0, 1, 2), // Original
                (1, 0, 2), // Rotated 90° around the vertical axis
                (0, 2, 1), // Tipped onto the width edge
                (2, 0, 1),
                (1, 2, 0), // Tipped onto the depth edge
                (2, 1, 0),
            ],
        }
    }

    /// Maximum number of orientations produced by this mode.
    pub fn count(&self) -> usize {
        self.permutations().len()
    }
}

/// One assignment of an item's extents to the width/depth/height axes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Orientation {
    /// Position of this orientation in the mode's permutation list.
    pub index: usize,
    /// Source axis for (width, depth, height).
    pub axes: (usize, usize, usize),
    /// Oriented extents (width, depth, height).
    pub dimensions: Vector3<f64>,
}

impl Orientation {
    /// Applies an axis permutation to the requested extents.
    pub fn from_axes(index: usize, axes: (usize, usize, usize), extents: &Vector3<f64>) -> Self {
        Self {
            index,
            axes,
            dimensions: Vector3::new(extents[axes.0], extents[axes.1], extents[axes.2]),
        }
    }

    /// Identity orientation for the given extents.
    pub fn identity(extents: &Vector3<f64>) -> Self {
        Self::from_axes(0, (0, 1, 2), extents)
    }

    /// Oriented width.
    pub fn width(&self) -> f64 {
        self.dimensions.x
    }

    /// Oriented depth.
    pub fn depth(&self) -> f64 {
        self.dimensions.y
    }

    /// Oriented height.
    pub fn height(&self) -> f64 {
        self.dimensions.z
    }

    /// True when the extents were permuted.
    pub fn is_rotated(&self) -> bool {
        self.axes != (0, 1, 2)
    }

    /// True when the requested height no longer points up.
    pub fn is_tipped(&self) -> bool {
        self.axes.2 != 2
    }
}
