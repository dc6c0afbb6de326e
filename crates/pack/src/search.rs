//! Placement search: matches one oriented item to a layer and position.
//!
//! Existing layers are tried bottom-up. Within a layer, fitting free
//! rectangles are tried best-fit first and each rectangle yields a
//! deterministic sequence of anchors: the origin corner, then footprints flush
//! with a corner of each support beneath the layer, then an optional coarse
//! grid. An anchor is accepted when the item stays inside the pallet, collides
//! with nothing already placed, rests exactly on the layer's base elevation
//! and passes the support evaluator.
//!
//! A layer's free space is its whole plane minus the footprints of the items
//! crossing it, so a footprint may span several coplanar supports or overhang
//! them; the support threshold and the centroid rule decide.
//!
//! When no existing layer can host the item, a new layer is opened on the
//! lowest elevation (the top of a placed item) that no layer starts at yet.

use crate::boundary::PalletBounds;
use crate::ledger::{FreeRect, FreeSpaceLedger, Layer};
use crate::spatial_index::Aabb3D;
use crate::stability::{SupportEvaluator, SupportInfo};
use crate::state::{PackingState, PlacedItem};
use u_pallet_core::{Config, Orientation, PlaceRequest, Placement, Rect2D};

/// Where a candidate would be committed.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateTarget {
    /// A free rectangle of an existing layer.
    Existing {
        /// Layer index.
        layer: usize,
        /// Free rectangle index within that layer.
        rect: usize,
    },
    /// A layer that does not exist yet.
    NewLayer {
        /// Base elevation of the new layer.
        base: f64,
        /// Free space of the plane at `base` before the item is committed.
        free_rects: Vec<FreeRect>,
        /// Index of the free rectangle the item goes into.
        rect: usize,
    },
}

/// An accepted position for an oriented item.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Where to commit.
    pub target: CandidateTarget,
    /// Footprint the item would occupy.
    pub footprint: Rect2D,
    /// Elevation of the item's bottom face.
    pub elevation: f64,
    /// Support found under the footprint.
    pub support: SupportInfo,
}

/// A footprint accepted inside one rectangle list.
struct Hit {
    rect: usize,
    footprint: Rect2D,
    support: SupportInfo,
}

/// Finds and commits positions for oriented items.
#[derive(Debug, Clone, Copy)]
pub struct PlacementSearch<'a> {
    bounds: &'a PalletBounds,
    config: &'a Config,
    ledger: FreeSpaceLedger,
    support: SupportEvaluator,
}

impl<'a> PlacementSearch<'a> {
    /// Creates a search over the given pallet and configuration.
    pub fn new(bounds: &'a PalletBounds, config: &'a Config) -> Self {
        Self {
            bounds,
            config,
            ledger: FreeSpaceLedger::from_config(config),
            support: SupportEvaluator::from_config(config),
        }
    }

    /// Tries each orientation in turn and commits the first that fits.
    ///
    /// Returns `None` without touching `state` when every orientation fails.
    pub fn place(
        &self,
        state: &mut PackingState,
        request: PlaceRequest,
        orientations: &[Orientation],
        source_index: usize,
    ) -> Option<Placement> {
        for orientation in orientations {
            if let Some(candidate) = self.find(state, orientation) {
                return Some(self.commit(state, candidate, request, *orientation, source_index));
            }
            log::trace!(
                "no position for item {} in orientation {:?}",
                source_index,
                orientation.axes
            );
        }
        None
    }

    /// Searches existing layers, then new layers, for a valid position.
    pub fn find(&self, state: &PackingState, orientation: &Orientation) -> Option<Candidate> {
        let eps = self.config.epsilon;
        if orientation.height() > self.bounds.usable_height() + eps {
            return None;
        }

        self.find_in_layers(state, orientation)
            .or_else(|| self.find_new_layer(state, orientation))
    }

    fn find_in_layers(&self, state: &PackingState, orientation: &Orientation) -> Option<Candidate> {
        for layer_index in layer_order(state.layers()) {
            let layer = &state.layers()[layer_index];
            let base = layer.base_elevation;
            if !self.fits_under_ceiling(base, orientation.height()) {
                continue;
            }

            if let Some(hit) = self.find_in_rects(state, &layer.free_rects, base, orientation) {
                return Some(Candidate {
                    target: CandidateTarget::Existing {
                        layer: layer_index,
                        rect: hit.rect,
                    },
                    footprint: hit.footprint,
                    elevation: base,
                    support: hit.support,
                });
            }
        }
        None
    }

    fn find_new_layer(&self, state: &PackingState, orientation: &Orientation) -> Option<Candidate> {
        let eps = self.config.epsilon;

        for base in self.candidate_elevations(state) {
            if !self.fits_under_ceiling(base, orientation.height()) {
                break;
            }
            // Already searched as an existing layer.
            if state
                .layers()
                .iter()
                .any(|layer| (layer.base_elevation - base).abs() <= eps)
            {
                continue;
            }

            let free_rects = self
                .ledger
                .carve(self.bounds.surface(), state.footprints_crossing(base, eps));
            if let Some(hit) = self.find_in_rects(state, &free_rects, base, orientation) {
                return Some(Candidate {
                    target: CandidateTarget::NewLayer {
                        base,
                        free_rects,
                        rect: hit.rect,
                    },
                    footprint: hit.footprint,
                    elevation: base,
                    support: hit.support,
                });
            }
        }
        None
    }

    /// First accepted footprint over `rects`, a plane at elevation `base`.
    fn find_in_rects(
        &self,
        state: &PackingState,
        rects: &[FreeRect],
        base: f64,
        orientation: &Orientation,
    ) -> Option<Hit> {
        let (w, d, h) = (orientation.width(), orientation.depth(), orientation.height());
        let supports = self.supports_at(state, base);
        if supports.as_ref().is_some_and(Vec::is_empty) {
            return None;
        }

        for rect_index in self.ledger.ranked(rects, w, d) {
            let rect = &rects[rect_index];
            let scan = self.scans(state, base, rect);
            for footprint in self.anchors(rect, w, d, scan, supports.as_deref()) {
                if let Some(support) = self.check(state, &footprint, base, h) {
                    return Some(Hit {
                        rect: rect_index,
                        footprint,
                        support,
                    });
                }
            }
        }
        None
    }

    /// Commits a candidate found by [`find`](Self::find) and returns the
    /// resulting placement.
    pub fn commit(
        &self,
        state: &mut PackingState,
        candidate: Candidate,
        request: PlaceRequest,
        orientation: Orientation,
        source_index: usize,
    ) -> Placement {
        let eps = self.config.epsilon;
        let height = orientation.height();
        let Candidate {
            target,
            footprint,
            elevation: base,
            support,
        } = candidate;

        let layer_index = match target {
            CandidateTarget::Existing { layer, rect } => {
                let existing = &mut state.layers[layer];
                self.ledger.commit(existing, rect, &footprint);
                existing.height = existing.height.max(height);
                layer
            }
            CandidateTarget::NewLayer { free_rects, rect, .. } => {
                let mut layer = Layer::new(base, height, free_rects);
                self.ledger.commit(&mut layer, rect, &footprint);
                state.layers.push(layer);
                log::debug!(
                    "opened layer {} at elevation {:.3} for item {}",
                    state.layers.len() - 1,
                    base,
                    source_index
                );
                state.layers.len() - 1
            }
        };

        // Keep every plane the item passes through free of its footprint.
        for (i, layer) in state.layers.iter_mut().enumerate() {
            let plane = layer.base_elevation;
            if i != layer_index && plane >= base - eps && plane < base + height - eps {
                self.ledger.occupy(layer, &footprint);
            }
        }

        let (cx, cz) = footprint.center();
        let item = PlacedItem::resting_at(cx, base, cz, request, orientation, source_index, layer_index)
            .with_support(support.fraction, self.support.threshold());
        let placement = item.placement();
        state.push_item(item);
        placement
    }

    /// Validates one footprint at one elevation.
    fn check(
        &self,
        state: &PackingState,
        footprint: &Rect2D,
        base: f64,
        height: f64,
    ) -> Option<SupportInfo> {
        let eps = self.config.epsilon;
        if !self.bounds.contains_footprint(footprint, eps) || !self.fits_under_ceiling(base, height) {
            return None;
        }

        let aabb = Aabb3D::from_footprint(footprint, base, height);
        if state.spatial_index().collides(&aabb, eps) {
            return None;
        }

        let info = self
            .support
            .evaluate(footprint, state.items(), self.bounds.pallet_top());
        if (info.elevation - base).abs() > eps || !self.support.accepts(&info) {
            return None;
        }
        Some(info)
    }

    fn fits_under_ceiling(&self, base: f64, height: f64) -> bool {
        base + height <= self.bounds.max_height() + self.config.epsilon
    }

    /// Footprints of the material at `elevation`. `None` on the pallet top,
    /// which supports everywhere.
    fn supports_at(&self, state: &PackingState, elevation: f64) -> Option<Vec<Rect2D>> {
        let eps = self.config.epsilon;
        if (elevation - self.bounds.pallet_top()).abs() <= eps {
            return None;
        }
        Some(state.footprints_topped_at(elevation, eps))
    }

    /// Grid scanning applies above the pallet, where the surface may be several
    /// item tops, and on the pallet wherever an item above overhangs `rect`.
    fn scans(&self, state: &PackingState, base: f64, rect: &FreeRect) -> bool {
        let eps = self.config.epsilon;
        self.config.grid_scan
            && (base > self.bounds.pallet_top() + eps
                || state.items().iter().any(|item| {
                    item.bottom() > base + eps && item.footprint().intersection(rect, eps).is_some()
                }))
    }

    /// Candidate footprints inside `rect`: the origin corner, then footprints
    /// flush with a corner of each support, then the grid when `scan` is set.
    ///
    /// With `supports` given, footprints touching none of them are dropped.
    fn anchors(
        &self,
        rect: &FreeRect,
        w: f64,
        d: f64,
        scan: bool,
        supports: Option<&[Rect2D]>,
    ) -> Vec<Rect2D> {
        let eps = self.config.epsilon;
        let span_x = (rect.width - w).max(0.0);
        let span_z = (rect.depth - d).max(0.0);
        let at = |x: f64, z: f64| {
            Rect2D::new(
                x.clamp(rect.min_x, rect.min_x + span_x),
                z.clamp(rect.min_z, rect.min_z + span_z),
                w,
                d,
            )
        };

        let mut anchors = vec![at(rect.min_x, rect.min_z)];
        for s in supports.unwrap_or(&[]) {
            for (x, z) in [
                (s.min_x, s.min_z),
                (s.max_x() - w, s.min_z),
                (s.min_x, s.max_z() - d),
                (s.max_x() - w, s.max_z() - d),
            ] {
                let anchor = at(x, z);
                if !anchors.contains(&anchor) {
                    anchors.push(anchor);
                }
            }
        }

        if scan {
            let step = (w.max(d) / 4.0).max(self.config.min_grid_step);
            let xs = scan_offsets(span_x, step, eps);
            let zs = scan_offsets(span_z, step, eps);
            anchors.reserve(xs.len() * zs.len());
            for &dz in &zs {
                for &dx in &xs {
                    if dx == 0.0 && dz == 0.0 {
                        continue;
                    }
                    anchors.push(Rect2D::new(rect.min_x + dx, rect.min_z + dz, w, d));
                }
            }
        }

        if let Some(supports) = supports {
            anchors.retain(|a| supports.iter().any(|s| s.intersection(a, eps).is_some()));
        }
        anchors
    }

    /// Base elevations a new layer may start from, ascending and unique.
    fn candidate_elevations(&self, state: &PackingState) -> Vec<f64> {
        let eps = self.config.epsilon;
        let mut elevations: Vec<f64> = std::iter::once(self.bounds.pallet_top())
            .chain(state.items().iter().map(PlacedItem::top))
            .collect();
        elevations.sort_by(f64::total_cmp);
        elevations.dedup_by(|a, b| (*a - *b).abs() <= eps);
        elevations
    }
}

/// Visiting order of layers: ascending base elevation, ties by index.
pub(crate) fn layer_order(layers: &[Layer]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..layers.len()).collect();
    order.sort_by(|&a, &b| {
        layers[a]
            .base_elevation
            .total_cmp(&layers[b].base_elevation)
            .then(a.cmp(&b))
    });
    order
}

/// Offsets `0, step, 2*step, ...` up to `span`, plus `span` itself.
fn scan_offsets(span: f64, step: f64, eps: f64) -> Vec<f64> {
    let count = (span / step).floor() as usize;
    let mut offsets: Vec<f64> = (0..=count).map(|i| i as f64 * step).collect();
    if offsets.last().is_some_and(|&last| span - last > eps) {
        offsets.push(span);
    }
    offsets
}
