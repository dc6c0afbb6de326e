//! Structural support evaluation.
//!
//! A candidate footprint is supported by whatever lies directly beneath it at
//! the highest elevation under the footprint. The evaluator accepts a
//! placement when
//!
//! 1. the supported fraction of the footprint meets the configured threshold,
//! 2. the footprint's center lies inside a single contiguous support region.
//!
//! The second rule rejects footprints bridging two supports with an
//! unsupported gap beneath their centroid, even when the aggregate support
//! fraction is high. Together they stand in for a physics simulation and
//! catch floating and tipping placements.

use crate::state::PlacedItem;
use u_pallet_core::{Config, Rect2D};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Support found under a candidate footprint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportInfo {
    /// Elevation the footprint would rest on.
    pub elevation: f64,
    /// Supported fraction of the footprint area (0.0 - 1.0).
    pub fraction: f64,
    /// Overlap rectangles between the footprint and each supporter.
    pub regions: Vec<Rect2D>,
    /// Indices of the supporting items; empty when resting on the pallet.
    pub supporters: Vec<usize>,
    /// Whether the footprint center falls inside one support region.
    pub centroid_supported: bool,
}

impl SupportInfo {
    /// Returns true if the footprint rests directly on the pallet.
    pub fn on_pallet(&self) -> bool {
        self.supporters.is_empty()
    }
}

/// Computes support elevation and fraction for candidate footprints.
#[derive(Debug, Clone, Copy)]
pub struct SupportEvaluator {
    threshold: f64,
    eps: f64,
}

impl SupportEvaluator {
    /// Creates an evaluator with the given threshold and tolerance.
    pub fn new(threshold: f64, eps: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            eps,
        }
    }

    /// Creates an evaluator using the configured threshold and tolerance.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.support_threshold, config.epsilon)
    }

    /// Returns the support threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Evaluates the support beneath `footprint`.
    pub fn evaluate(&self, footprint: &Rect2D, items: &[PlacedItem], pallet_top: f64) -> SupportInfo {
        let eps = self.eps;

        let highest = items
            .iter()
            .filter(|item| footprint.intersection(&item.footprint(), eps).is_some())
            .map(PlacedItem::top)
            .fold(pallet_top, f64::max);

        if (highest - pallet_top).abs() <= eps {
            return SupportInfo {
                elevation: pallet_top,
                fraction: 1.0,
                regions: vec![*footprint],
                supporters: Vec::new(),
                centroid_supported: true,
            };
        }

        let mut regions = Vec::new();
        let mut supporters = Vec::new();
        for (i, item) in items.iter().enumerate() {
            if (item.top() - highest).abs() > eps {
                continue;
            }
            if let Some(region) = footprint.intersection(&item.footprint(), eps) {
                regions.push(region);
                supporters.push(i);
            }
        }

        let area = footprint.area().max(1e-12);
        let supported: f64 = regions.iter().map(Rect2D::area).sum();
        let fraction = (supported / area).clamp(0.0, 1.0);

        let (cx, cz) = footprint.center();
        let centroid_supported = regions.iter().any(|r| r.contains_point(cx, cz, eps));

        SupportInfo {
            elevation: highest,
            fraction,
            regions,
            supporters,
            centroid_supported,
        }
    }

    /// Returns true if the support is sufficient for a placement.
    pub fn accepts(&self, info: &SupportInfo) -> bool {
        info.fraction + self.eps >= self.threshold && info.centroid_supported
    }

    /// Re-checks every item against the items committed before it.
    ///
    /// Items are expected in insertion order, which is the order their support
    /// was evaluated in when they were committed. Each item is held to the
    /// threshold recorded when it was committed, not to this evaluator's.
    pub fn audit(&self, items: &[PlacedItem], pallet_top: f64) -> SupportReport {
        let mut report = SupportReport::new();

        for (i, item) in items.iter().enumerate() {
            let info = self.evaluate(&item.footprint(), &items[..i], pallet_top);
            let resting = (info.elevation - item.bottom()).abs() <= self.eps;
            let is_stable = resting
                && info.fraction + self.eps >= item.support_threshold
                && info.centroid_supported;

            report.results.push(SupportAudit {
                index: i,
                is_stable,
                resting,
                support_ratio: info.fraction,
                threshold: item.support_threshold,
                centroid_supported: info.centroid_supported,
                supported_by: info.supporters,
            });
        }

        report.summarize();
        report
    }
}

impl Default for SupportEvaluator {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Audit result for a single committed item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportAudit {
    /// Index of the item in insertion order.
    pub index: usize,
    /// Whether the item rests on its support and meets the acceptance rules.
    pub is_stable: bool,
    /// Whether the item's bottom coincides with the support elevation.
    pub resting: bool,
    /// Supported fraction of the footprint.
    pub support_ratio: f64,
    /// Threshold the item was committed under.
    pub threshold: f64,
    /// Whether the centroid lies over one support region.
    pub centroid_supported: bool,
    /// Indices of supporting items.
    pub supported_by: Vec<usize>,
}

/// Support audit of a whole packing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportReport {
    /// Individual results for each item.
    pub results: Vec<SupportAudit>,
    /// Number of stable items.
    pub stable_count: usize,
    /// Number of unstable items.
    pub unstable_count: usize,
    /// Minimum support ratio among all items.
    pub min_support_ratio: f64,
}

impl SupportReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            stable_count: 0,
            unstable_count: 0,
            min_support_ratio: 1.0,
        }
    }

    /// Returns true if all items are stable.
    pub fn is_all_stable(&self) -> bool {
        self.unstable_count == 0
    }

    fn summarize(&mut self) {
        self.stable_count = self.results.iter().filter(|r| r.is_stable).count();
        self.unstable_count = self.results.len() - self.stable_count;
        self.min_support_ratio = self
            .results
            .iter()
            .map(|r| r.support_ratio)
            .fold(1.0, f64::min);
    }
}

impl Default for SupportReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn block(x: f64, z: f64, w: f64, d: f64, h: f64) -> PlacedItem {
        PlacedItem::from_center(Point3::new(x, h / 2.0, z), w, d, h)
    }

    #[test]
    fn test_empty_pallet_full_support() {
        let evaluator = SupportEvaluator::new(0.75, 1e-9);
        let footprint = Rect2D::new(-10.0, -10.0, 20.0, 20.0);
        let info = evaluator.evaluate(&footprint, &[], 0.0);

        assert!(info.on_pallet());
        assert_relative_eq!(info.fraction, 1.0);
        assert_relative_eq!(info.elevation, 0.0);
        assert!(evaluator.accepts(&info));
    }

    #[test]
    fn test_fully_stacked() {
        let evaluator = SupportEvaluator::new(0.75, 1e-9);
        let items = vec![block(0.0, 0.0, 40.0, 40.0, 10.0)];
        let info = evaluator.evaluate(&Rect2D::new(-20.0, -20.0, 40.0, 40.0), &items, 0.0);

        assert_relative_eq!(info.elevation, 10.0);
        assert_relative_eq!(info.fraction, 1.0);
        assert_eq!(info.supporters, vec![0]);
        assert!(evaluator.accepts(&info));
    }

    #[test]
    fn test_partial_support_below_threshold() {
        let evaluator = SupportEvaluator::new(0.75, 1e-9);
        // Base covers x in [-20, 20]; footprint covers x in [0, 40].
        let items = vec![block(0.0, 0.0, 40.0, 40.0, 10.0)];
        let info = evaluator.evaluate(&Rect2D::new(0.0, -20.0, 40.0, 40.0), &items, 0.0);

        assert_relative_eq!(info.fraction, 0.5);
        assert!(!evaluator.accepts(&info));
    }

    #[test]
    fn test_only_highest_tops_count() {
        let evaluator = SupportEvaluator::new(0.4, 1e-9);
        let items = vec![
            block(-10.0, 0.0, 20.0, 40.0, 10.0),
            block(10.0, 0.0, 20.0, 40.0, 12.0),
        ];
        let info = evaluator.evaluate(&Rect2D::new(-20.0, -20.0, 40.0, 40.0), &items, 0.0);

        assert_relative_eq!(info.elevation, 12.0);
        assert_relative_eq!(info.fraction, 0.5);
        assert_eq!(info.supporters, vec![1]);
    }

    #[test]
    fn test_centroid_over_gap_is_rejected() {
        let evaluator = SupportEvaluator::new(0.75, 1e-9);
        // Two supports under the footprint's ends, a gap under its center.
        let items = vec![
            block(-30.0, 0.0, 50.0, 40.0, 10.0),
            block(30.0, 0.0, 50.0, 40.0, 10.0),
        ];
        let footprint = Rect2D::new(-50.0, -20.0, 100.0, 40.0);
        let info = evaluator.evaluate(&footprint, &items, 0.0);

        assert_relative_eq!(info.fraction, 0.9);
        assert!(!info.centroid_supported);
        assert!(!evaluator.accepts(&info));
    }

    #[test]
    fn test_threshold_is_clamped() {
        assert_relative_eq!(SupportEvaluator::new(2.0, 1e-9).threshold(), 1.0);
        assert_relative_eq!(SupportEvaluator::new(-1.0, 1e-9).threshold(), 0.0);
    }

    #[test]
    fn test_audit_flags_floating_item() {
        let evaluator = SupportEvaluator::new(0.75, 1e-9);
        let items = vec![
            block(0.0, 0.0, 40.0, 40.0, 10.0),
            PlacedItem::from_center(Point3::new(0.0, 15.0, 0.0), 40.0, 40.0, 10.0),
            PlacedItem::from_center(Point3::new(100.0, 30.0, 0.0), 10.0, 10.0, 10.0),
        ];
        let report = evaluator.audit(&items, 0.0);

        assert_eq!(report.results.len(), 3);
        assert!(report.results[0].is_stable);
        assert!(report.results[1].is_stable);
        assert!(!report.results[2].resting);
        assert_eq!(report.unstable_count, 1);
        assert!(!report.is_all_stable());
    }

    #[test]
    fn test_audit_uses_recorded_threshold() {
        // Half of the upper box rests on the lower one.
        let items = vec![
            block(-20.0, 0.0, 40.0, 40.0, 10.0),
            PlacedItem::from_center(Point3::new(0.0, 15.0, 0.0), 40.0, 40.0, 10.0)
                .with_support(0.5, 0.5),
        ];

        let strict = SupportEvaluator::new(0.9, 1e-9);
        let report = strict.audit(&items, 0.0);
        assert!(report.is_all_stable());
        assert_relative_eq!(report.results[1].support_ratio, 0.5);
        assert_relative_eq!(report.results[1].threshold, 0.5);

        let overclaimed = vec![items[0].clone(), items[1].clone().with_support(0.5, 0.75)];
        assert!(!strict.audit(&overclaimed, 0.0).is_all_stable());
    }
}
