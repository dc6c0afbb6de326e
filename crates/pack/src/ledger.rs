//! Per-layer free-space bookkeeping.
//!
//! Each [`Layer`] tracks the unoccupied parts of its plane as a list of
//! axis-aligned free rectangles. Committing a footprint replaces every free
//! rectangle it touches with up to four residual strips:
//!
//! ```text
//!   +------+--------+-------+
//!   |      |  back  |       |
//!   |      +--------+       |
//!   | left |  item  | right |
//!   |      +--------+       |
//!   |      | front  |       |
//!   +------+--------+-------+
//! ```
//!
//! Left and right strips span the full depth of the consumed rectangle; front
//! and back strips only span the item's x-range, so the residuals of one
//! rectangle are pairwise disjoint. A pruning pass then drops rectangles
//! nested inside another one.

use std::cmp::Ordering;
use u_pallet_core::{Config, Rect2D};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An unoccupied footprint region within a layer's plane.
pub type FreeRect = Rect2D;

/// A stacking tier with its own base elevation and free space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layer {
    /// Elevation items in this layer rest on.
    pub base_elevation: f64,
    /// Tallest item assigned to this layer so far.
    pub height: f64,
    /// Unoccupied regions of the layer's plane.
    pub free_rects: Vec<FreeRect>,
}

impl Layer {
    /// Creates a layer.
    pub fn new(base_elevation: f64, height: f64, free_rects: Vec<FreeRect>) -> Self {
        Self {
            base_elevation,
            height,
            free_rects,
        }
    }

    /// Elevation of the tallest item's top in this layer.
    pub fn top(&self) -> f64 {
        self.base_elevation + self.height
    }

    /// Total free area in this layer.
    pub fn free_area(&self) -> f64 {
        self.free_rects.iter().map(Rect2D::area).sum()
    }
}

/// Best-fit ranking of a free rectangle for a given footprint.
///
/// Lower is better: best area fit first, ties broken by best short side fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    /// Rectangle area minus footprint area.
    pub area_waste: f64,
    /// Smaller of the two leftover side lengths.
    pub short_side_waste: f64,
}

impl CandidateScore {
    /// Total order used for ranking.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.area_waste
            .total_cmp(&other.area_waste)
            .then(self.short_side_waste.total_cmp(&other.short_side_waste))
    }
}

/// Split, query and prune operations over a layer's free rectangles.
#[derive(Debug, Clone, Copy)]
pub struct FreeSpaceLedger {
    eps: f64,
    area_eps: f64,
}

impl FreeSpaceLedger {
    /// Creates a ledger with the given length and area tolerances.
    pub fn new(eps: f64, area_eps: f64) -> Self {
        Self { eps, area_eps }
    }

    /// Creates a ledger using the configured tolerances.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.epsilon, config.area_epsilon)
    }

    /// Returns the indices of free rectangles large enough for a `width` x
    /// `depth` footprint, with their scores, in ledger order.
    pub fn query(&self, layer: &Layer, width: f64, depth: f64) -> Vec<(usize, CandidateScore)> {
        self.query_rects(&layer.free_rects, width, depth)
    }

    /// [`query`](Self::query) over an arbitrary rectangle list.
    pub fn query_rects(
        &self,
        rects: &[FreeRect],
        width: f64,
        depth: f64,
    ) -> Vec<(usize, CandidateScore)> {
        rects
            .iter()
            .enumerate()
            .filter(|(_, r)| r.fits(width, depth, self.eps))
            .map(|(i, r)| (i, Self::score_candidate(r, width, depth)))
            .collect()
    }

    /// Fitting rectangle indices sorted best-first. Ties keep ledger order.
    pub fn ranked(&self, rects: &[FreeRect], width: f64, depth: f64) -> Vec<usize> {
        let mut candidates = self.query_rects(rects, width, depth);
        candidates.sort_by(|a, b| a.1.compare(&b.1));
        candidates.into_iter().map(|(i, _)| i).collect()
    }

    /// Scores a rectangle for a footprint.
    pub fn score_candidate(rect: &FreeRect, width: f64, depth: f64) -> CandidateScore {
        CandidateScore {
            area_waste: rect.area() - width * depth,
            short_side_waste: (rect.width - width).abs().min((rect.depth - depth).abs()),
        }
    }

    /// Four-way residual split of `rect` around `footprint`.
    ///
    /// Residuals thinner than the length tolerance or smaller than the area
    /// tolerance are discarded. A rectangle the footprint does not overlap is
    /// returned unchanged.
    pub fn split(&self, rect: &FreeRect, footprint: &Rect2D) -> Vec<FreeRect> {
        if rect.intersection(footprint, self.eps).is_none() {
            return vec![*rect];
        }

        let (r_min_x, r_max_x) = (rect.min_x, rect.max_x());
        let (r_min_z, r_max_z) = (rect.min_z, rect.max_z());
        let (p_min_x, p_max_x) = (footprint.min_x, footprint.max_x());
        let (p_min_z, p_max_z) = (footprint.min_z, footprint.max_z());

        let span_min_x = r_min_x.max(p_min_x);
        let span_max_x = r_max_x.min(p_max_x);

        let candidates = [
            // left
            Rect2D::from_corners(r_min_x, r_min_z, p_min_x.min(r_max_x), r_max_z),
            // right
            Rect2D::from_corners(p_max_x.max(r_min_x), r_min_z, r_max_x, r_max_z),
            // front
            Rect2D::from_corners(span_min_x, r_min_z, span_max_x, p_min_z.min(r_max_z)),
            // back
            Rect2D::from_corners(span_min_x, p_max_z.max(r_min_z), span_max_x, r_max_z),
        ];

        candidates
            .into_iter()
            .filter(|r| r.width > self.eps && r.depth > self.eps && r.area() > self.area_eps)
            .collect()
    }

    /// Commits `footprint` into the free rectangle at `rect_index`.
    ///
    /// The consumed rectangle is replaced in place by its residuals. Any other
    /// rectangle the footprint overlaps is split as well, then the layer is
    /// pruned.
    pub fn commit(&self, layer: &mut Layer, rect_index: usize, footprint: &Rect2D) {
        debug_assert!(rect_index < layer.free_rects.len());
        debug_assert!(layer.free_rects[rect_index].contains(footprint, self.eps));

        let mut next = Vec::with_capacity(layer.free_rects.len() + 3);
        for (i, rect) in layer.free_rects.iter().enumerate() {
            if i == rect_index || rect.intersection(footprint, self.eps).is_some() {
                next.extend(self.split(rect, footprint));
            } else {
                next.push(*rect);
            }
        }
        layer.free_rects = next;
        self.prune(layer);
    }

    /// Removes `footprint` from every free rectangle of the layer.
    pub fn occupy(&self, layer: &mut Layer, footprint: &Rect2D) {
        if !layer
            .free_rects
            .iter()
            .any(|r| r.intersection(footprint, self.eps).is_some())
        {
            return;
        }

        let rects = std::mem::take(&mut layer.free_rects);
        layer.free_rects = rects
            .iter()
            .flat_map(|r| self.split(r, footprint))
            .collect();
        self.prune(layer);
    }

    /// Free rectangles left in `surface` once every footprint in `occupied`
    /// is removed.
    pub fn carve<I>(&self, surface: FreeRect, occupied: I) -> Vec<FreeRect>
    where
        I: IntoIterator<Item = Rect2D>,
    {
        let mut layer = Layer::new(0.0, 0.0, vec![surface]);
        for footprint in occupied {
            self.occupy(&mut layer, &footprint);
        }
        layer.free_rects
    }

    /// Drops every free rectangle wholly contained in another one.
    ///
    /// Of two identical rectangles the later one survives.
    pub fn prune(&self, layer: &mut Layer) {
        let rects = &layer.free_rects;
        let n = rects.len();
        let mut keep = vec![true; n];

        for i in 0..n {
            for j in 0..n {
                if i != j && keep[j] && rects[j].contains(&rects[i], self.eps) {
                    keep[i] = false;
                    break;
                }
            }
        }

        let mut flags = keep.into_iter();
        layer.free_rects.retain(|_| flags.next().unwrap_or(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ledger() -> FreeSpaceLedger {
        FreeSpaceLedger::new(1e-9, 1e-9)
    }

    fn pallet_layer() -> Layer {
        Layer::new(0.0, 0.0, vec![Rect2D::new(-40.0, -60.0, 80.0, 120.0)])
    }

    #[test]
    fn test_query_respects_tolerance() {
        let layer = pallet_layer();
        assert_eq!(ledger().query(&layer, 80.0, 120.0).len(), 1);
        assert_eq!(ledger().query(&layer, 80.0 + 1e-12, 120.0).len(), 1);
        assert!(ledger().query(&layer, 81.0, 120.0).is_empty());
    }

    #[test]
    fn test_score_candidate() {
        let rect = Rect2D::new(0.0, 0.0, 50.0, 30.0);
        let score = FreeSpaceLedger::score_candidate(&rect, 40.0, 25.0);
        assert_relative_eq!(score.area_waste, 1500.0 - 1000.0);
        assert_relative_eq!(score.short_side_waste, 5.0);
    }

    #[test]
    fn test_ranked_prefers_tighter_fit() {
        let rects = vec![
            Rect2D::new(0.0, 0.0, 100.0, 100.0),
            Rect2D::new(200.0, 0.0, 20.0, 20.0),
            Rect2D::new(300.0, 0.0, 5.0, 5.0),
        ];
        assert_eq!(ledger().ranked(&rects, 10.0, 10.0), vec![1, 0]);
    }

    #[test]
    fn test_split_corner_placement() {
        let rect = Rect2D::new(-40.0, -60.0, 80.0, 120.0);
        let footprint = Rect2D::new(-40.0, -60.0, 80.0, 60.0);
        let residuals = ledger().split(&rect, &footprint);

        assert_eq!(residuals.len(), 1);
        assert_relative_eq!(residuals[0].min_z, 0.0);
        assert_relative_eq!(residuals[0].area(), 4800.0);
    }

    #[test]
    fn test_split_center_placement_is_disjoint() {
        let rect = Rect2D::new(0.0, 0.0, 100.0, 100.0);
        let footprint = Rect2D::new(40.0, 40.0, 20.0, 20.0);
        let residuals = ledger().split(&rect, &footprint);

        assert_eq!(residuals.len(), 4);
        let total: f64 = residuals.iter().map(Rect2D::area).sum();
        assert_relative_eq!(total, 10000.0 - 400.0);

        for (i, a) in residuals.iter().enumerate() {
            assert!(a.intersection(&footprint, 1e-9).is_none());
            for b in residuals.iter().skip(i + 1) {
                assert!(a.intersection(b, 1e-9).is_none());
            }
        }
    }

    #[test]
    fn test_commit_full_consumption() {
        let mut layer = pallet_layer();
        ledger().commit(&mut layer, 0, &Rect2D::new(-40.0, -60.0, 80.0, 120.0));
        assert!(layer.free_rects.is_empty());
        assert_relative_eq!(layer.free_area(), 0.0);
    }

    #[test]
    fn test_commit_discards_slivers() {
        let mut layer = Layer::new(0.0, 0.0, vec![Rect2D::new(0.0, 0.0, 10.0, 10.0)]);
        ledger().commit(&mut layer, 0, &Rect2D::new(0.0, 0.0, 10.0 - 1e-12, 10.0));
        assert!(layer.free_rects.is_empty());
    }

    #[test]
    fn test_occupy_splits_every_overlapping_rect() {
        let mut layer = Layer::new(
            0.0,
            0.0,
            vec![
                Rect2D::new(0.0, 0.0, 10.0, 10.0),
                Rect2D::new(10.0, 0.0, 10.0, 10.0),
            ],
        );
        let footprint = Rect2D::new(5.0, 0.0, 10.0, 10.0);
        ledger().occupy(&mut layer, &footprint);

        for rect in &layer.free_rects {
            assert!(rect.intersection(&footprint, 1e-9).is_none());
        }
        assert_relative_eq!(layer.free_area(), 100.0);
    }

    #[test]
    fn test_prune_removes_nested() {
        let mut layer = Layer::new(
            0.0,
            0.0,
            vec![
                Rect2D::new(2.0, 2.0, 3.0, 3.0),
                Rect2D::new(0.0, 0.0, 10.0, 10.0),
                Rect2D::new(20.0, 0.0, 5.0, 5.0),
                Rect2D::new(20.0, 0.0, 5.0, 5.0),
            ],
        );
        ledger().prune(&mut layer);

        assert_eq!(layer.free_rects.len(), 2);
        for (i, a) in layer.free_rects.iter().enumerate() {
            for (j, b) in layer.free_rects.iter().enumerate() {
                if i != j {
                    assert!(!a.contains(b, 1e-9));
                }
            }
        }
    }

    #[test]
    fn test_carve_plane() {
        let surface = Rect2D::new(-40.0, -60.0, 80.0, 120.0);
        assert_eq!(ledger().carve(surface, None), vec![surface]);

        let right_half = Rect2D::new(0.0, -60.0, 40.0, 120.0);
        assert_eq!(
            ledger().carve(surface, [right_half]),
            vec![Rect2D::new(-40.0, -60.0, 40.0, 120.0)]
        );
    }
}
