//! Placed items and the packing state that owns them.

use crate::boundary::PalletBounds;
use crate::ledger::Layer;
use crate::spatial_index::{Aabb3D, SpatialIndex3D};
use nalgebra::{Point3, Vector3};
use u_pallet_core::{Orientation, PlaceRequest, Placement, Rect2D};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An item committed to the pallet.
///
/// `position` is the geometric center with y pointing up; `dimensions` holds
/// the oriented (width, depth, height). The support fields stay zero until
/// the item is committed or adopted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacedItem {
    /// Center of the item.
    pub position: Point3<f64>,
    /// Oriented extents (width, depth, height).
    pub dimensions: Vector3<f64>,
    /// Index of the originating request in the batch or queue that placed it.
    pub source_index: usize,
    /// The request as submitted, before orientation.
    pub request: PlaceRequest,
    /// Orientation used.
    pub orientation: Orientation,
    /// Layer the item was committed to.
    pub layer_index: usize,
    /// Supported fraction of the footprint when the item was committed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub support_ratio: f64,
    /// Support threshold in force when the item was committed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub support_threshold: f64,
}

impl PlacedItem {
    /// Creates an item whose footprint is centered on (`x`, `z`) and whose
    /// bottom face rests at elevation `base`.
    pub fn resting_at(
        x: f64,
        base: f64,
        z: f64,
        request: PlaceRequest,
        orientation: Orientation,
        source_index: usize,
        layer_index: usize,
    ) -> Self {
        let dimensions = orientation.dimensions;
        Self {
            position: Point3::new(x, base + dimensions.z / 2.0, z),
            dimensions,
            source_index,
            request,
            orientation,
            layer_index,
            support_ratio: 0.0,
            support_threshold: 0.0,
        }
    }

    /// Creates an unrotated item from its center and extents.
    pub fn from_center(center: Point3<f64>, width: f64, depth: f64, height: f64) -> Self {
        let request = PlaceRequest::new(width, depth, height);
        let orientation = Orientation::identity(&request.extents());
        Self {
            position: center,
            dimensions: orientation.dimensions,
            source_index: 0,
            request,
            orientation,
            layer_index: 0,
            support_ratio: 0.0,
            support_threshold: 0.0,
        }
    }

    /// Records the support the item was accepted with.
    pub fn with_support(mut self, ratio: f64, threshold: f64) -> Self {
        self.support_ratio = ratio;
        self.support_threshold = threshold;
        self
    }

    /// Returns the width.
    pub fn width(&self) -> f64 {
        self.dimensions.x
    }

    /// Returns the depth.
    pub fn depth(&self) -> f64 {
        self.dimensions.y
    }

    /// Returns the height.
    pub fn height(&self) -> f64 {
        self.dimensions.z
    }

    /// Elevation of the bottom face.
    pub fn bottom(&self) -> f64 {
        self.position.y - self.dimensions.z / 2.0
    }

    /// Elevation of the top face.
    pub fn top(&self) -> f64 {
        self.position.y + self.dimensions.z / 2.0
    }

    /// Plan-view footprint.
    pub fn footprint(&self) -> Rect2D {
        Rect2D::from_center(
            self.position.x,
            self.position.z,
            self.dimensions.x,
            self.dimensions.y,
        )
    }

    /// Bounding box in (x, y, z).
    pub fn aabb(&self) -> Aabb3D {
        Aabb3D::from_footprint(&self.footprint(), self.bottom(), self.height())
    }

    /// Volume of the item.
    pub fn volume(&self) -> f64 {
        self.dimensions.x * self.dimensions.y * self.dimensions.z
    }

    /// Returns true if the item's body crosses the horizontal plane at
    /// `elevation`. An item whose top is at `elevation` does not.
    pub fn occupies_plane(&self, elevation: f64, eps: f64) -> bool {
        self.bottom() <= elevation + eps && self.top() > elevation + eps
    }

    /// The placement record for this item.
    pub fn placement(&self) -> Placement {
        Placement {
            x: self.position.x,
            y: self.bottom(),
            z: self.position.z,
            layer_index: self.layer_index,
            rotated: self.orientation.is_rotated(),
            orientation: self.orientation,
        }
    }
}

/// Layers plus placed items, exclusively owned by one engine.
///
/// Items are kept in insertion order. The spatial index mirrors the item
/// list and backs collision checks independently of layer bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct PackingState {
    pub(crate) layers: Vec<Layer>,
    pub(crate) items: Vec<PlacedItem>,
    pub(crate) index: SpatialIndex3D,
}

impl PackingState {
    /// Creates a state with a single empty layer on the pallet top.
    pub fn new(bounds: &PalletBounds) -> Self {
        Self {
            layers: vec![Self::base_layer(bounds)],
            items: Vec::new(),
            index: SpatialIndex3D::new(),
        }
    }

    fn base_layer(bounds: &PalletBounds) -> Layer {
        Layer::new(bounds.pallet_top(), 0.0, vec![bounds.surface()])
    }

    /// Discards all items and layers and recreates the base layer.
    pub fn reset(&mut self, bounds: &PalletBounds) {
        self.layers.clear();
        self.layers.push(Self::base_layer(bounds));
        self.items.clear();
        self.index.clear();
    }

    /// Layers in creation order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Placed items in insertion order.
    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    /// Collision index over the placed items.
    pub fn spatial_index(&self) -> &SpatialIndex3D {
        &self.index
    }

    /// Number of placed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Highest layer top, floored at the pallet top.
    pub fn stack_top(&self, pallet_top: f64) -> f64 {
        self.layers
            .iter()
            .map(Layer::top)
            .fold(pallet_top, f64::max)
    }

    /// Total volume of placed items.
    pub fn placed_volume(&self) -> f64 {
        self.items.iter().map(PlacedItem::volume).sum()
    }

    /// Free rectangles of every layer, in layer order.
    pub fn free_rect_snapshot(&self) -> Vec<Vec<Rect2D>> {
        self.layers.iter().map(|l| l.free_rects.clone()).collect()
    }

    /// Footprints of the items whose body crosses the plane at `elevation`.
    pub fn footprints_crossing(
        &self,
        elevation: f64,
        eps: f64,
    ) -> impl Iterator<Item = Rect2D> + '_ {
        self.items
            .iter()
            .filter(move |item| item.occupies_plane(elevation, eps))
            .map(PlacedItem::footprint)
    }

    /// Footprints of the items whose top face lies at `elevation`.
    pub fn footprints_topped_at(&self, elevation: f64, eps: f64) -> Vec<Rect2D> {
        self.items
            .iter()
            .filter(|item| (item.top() - elevation).abs() <= eps)
            .map(PlacedItem::footprint)
            .collect()
    }

    pub(crate) fn push_item(&mut self, item: PlacedItem) {
        self.index.insert(self.items.len(), item.aabb());
        self.items.push(item);
    }
}
