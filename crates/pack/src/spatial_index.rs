//! Overlap queries for committed items.
//!
//! Boxes are in (x, y, z) with y pointing up. The index is a flat list; a
//! pallet holds few enough items that a linear scan beats a tree.

use nalgebra::Point3;
use u_pallet_core::Rect2D;

/// Axis-aligned box in pallet coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3D {
    /// Corner with the smallest x, y and z.
    pub min: Point3<f64>,
    /// Corner with the largest x, y and z.
    pub max: Point3<f64>,
}

impl Aabb3D {
    /// Creates a box from its two extreme corners.
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Box standing on `footprint` from elevation `bottom` up by `height`.
    pub fn from_footprint(footprint: &Rect2D, bottom: f64, height: f64) -> Self {
        Self {
            min: Point3::new(footprint.min_x, bottom, footprint.min_z),
            max: Point3::new(footprint.max_x(), bottom + height, footprint.max_z()),
        }
    }

    /// True when the interiors overlap by more than `eps` on every axis.
    /// Face contact is not overlap.
    pub fn overlaps(&self, other: &Aabb3D, eps: f64) -> bool {
        (0..3).all(|i| self.min[i] < other.max[i] - eps && self.max[i] > other.min[i] + eps)
    }

    /// True when `other` lies inside this box, within `eps`.
    pub fn contains(&self, other: &Aabb3D, eps: f64) -> bool {
        (0..3).all(|i| other.min[i] >= self.min[i] - eps && other.max[i] <= self.max[i] + eps)
    }

    /// Volume of the box.
    pub fn volume(&self) -> f64 {
        let size = self.max - self.min;
        size.x * size.y * size.z
    }
}

/// A committed item's box, keyed by placement order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialEntry3D {
    /// Position of the item in placement order.
    pub index: usize,
    /// Bounding box of the item.
    pub aabb: Aabb3D,
}

/// Boxes of every committed item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialIndex3D {
    entries: Vec<SpatialEntry3D>,
}

impl SpatialIndex3D {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the box of the item at `index`.
    pub fn insert(&mut self, index: usize, aabb: Aabb3D) {
        self.entries.push(SpatialEntry3D { index, aabb });
    }

    /// Number of indexed boxes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every box.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries whose interiors overlap `query`, in placement order.
    pub fn query_aabb(&self, query: &Aabb3D, eps: f64) -> Vec<&SpatialEntry3D> {
        self.entries
            .iter()
            .filter(|entry| entry.aabb.overlaps(query, eps))
            .collect()
    }

    /// True if `aabb` would interpenetrate a committed item.
    pub fn collides(&self, aabb: &Aabb3D, eps: f64) -> bool {
        self.entries.iter().any(|entry| entry.aabb.overlaps(aabb, eps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPS: f64 = 1e-9;

    fn cube(x: f64, y: f64, z: f64, size: f64) -> Aabb3D {
        Aabb3D::new(Point3::new(x, y, z), Point3::new(x + size, y + size, z + size))
    }

    #[test]
    fn test_overlap_and_contact() {
        let a = cube(0.0, 0.0, 0.0, 10.0);
        assert!(a.overlaps(&cube(5.0, 5.0, 5.0, 10.0), EPS));
        assert!(!a.overlaps(&cube(20.0, 0.0, 0.0, 10.0), EPS));

        // Stacked and side-by-side boxes only touch.
        assert!(!a.overlaps(&cube(0.0, 10.0, 0.0, 10.0), EPS));
        assert!(!a.overlaps(&cube(10.0, 0.0, 0.0, 10.0), EPS));
    }

    #[test]
    fn test_from_footprint() {
        let footprint = Rect2D::new(-40.0, -60.0, 80.0, 120.0);
        let b = Aabb3D::from_footprint(&footprint, 5.0, 10.0);
        assert_eq!(b.min, Point3::new(-40.0, 5.0, -60.0));
        assert_eq!(b.max, Point3::new(40.0, 15.0, 60.0));
        assert_relative_eq!(b.volume(), 96000.0);
    }

    #[test]
    fn test_contains() {
        let pallet = cube(0.0, 0.0, 0.0, 100.0);
        let item = cube(90.0, 0.0, 0.0, 10.0);
        assert!(pallet.contains(&item, EPS));
        assert!(!item.contains(&pallet, EPS));
        assert!(!pallet.contains(&cube(95.0, 0.0, 0.0, 10.0), EPS));
    }

    #[test]
    fn test_index_queries() {
        let mut index = SpatialIndex3D::new();
        index.insert(0, cube(0.0, 0.0, 0.0, 10.0));
        index.insert(1, cube(20.0, 0.0, 0.0, 10.0));
        assert_eq!(index.len(), 2);

        let spanning = Aabb3D::new(Point3::new(5.0, 0.0, 0.0), Point3::new(25.0, 5.0, 5.0));
        let hits: Vec<usize> = index.query_aabb(&spanning, EPS).iter().map(|e| e.index).collect();
        assert_eq!(hits, vec![0, 1]);

        let gap = Aabb3D::new(Point3::new(10.0, 0.0, 0.0), Point3::new(20.0, 10.0, 10.0));
        assert!(!index.collides(&gap, EPS));

        index.clear();
        assert!(index.is_empty());
    }
}
