//! Online pallet packing engine.

use crate::boundary::PalletBounds;
use crate::ledger::{FreeSpaceLedger, Layer};
use crate::planner::BatchPlanner;
use crate::queue::PlacementQueue;
use crate::simulation::{SimulationEngine, SimulationTrace};
use crate::stability::{SupportEvaluator, SupportReport};
use crate::state::{PackingState, PlacedItem};
use u_pallet_core::{
    validate_threshold, BatchItemResult, BatchPlaceResult, Config, Error, PlaceRequest,
    PlaceResult, Result,
};

/// Layer-based online pallet packer.
///
/// Owns the packing state exclusively. All mutating operations take
/// `&mut self`; callers sharing an engine across threads must serialize
/// access themselves.
#[derive(Debug, Clone)]
pub struct PalletPacker {
    bounds: PalletBounds,
    config: Config,
    state: PackingState,
    queue: PlacementQueue,
}

impl PalletPacker {
    /// Creates a packer with an empty pallet.
    pub fn new(bounds: PalletBounds, config: Config) -> Result<Self> {
        bounds.validate()?;
        config.validate()?;
        Ok(Self {
            state: PackingState::new(&bounds),
            bounds,
            config,
            queue: PlacementQueue::new(),
        })
    }

    /// Creates a packer with default configuration.
    pub fn with_bounds(bounds: PalletBounds) -> Result<Self> {
        Self::new(bounds, Config::default())
    }

    /// Returns the pallet bounds.
    pub fn bounds(&self) -> &PalletBounds {
        &self.bounds
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the packing state.
    pub fn state(&self) -> &PackingState {
        &self.state
    }

    /// Placed items in placement order.
    pub fn placed_items(&self) -> &[PlacedItem] {
        self.state.items()
    }

    /// Layers in creation order.
    pub fn layers(&self) -> &[Layer] {
        self.state.layers()
    }

    /// Placed volume over usable pallet volume.
    pub fn utilization(&self) -> f64 {
        self.state.placed_volume() / self.bounds.volume()
    }

    /// Places a single item, trying every allowed orientation.
    pub fn place(&mut self, request: PlaceRequest) -> PlaceResult {
        let index = self.state.len();
        let planner = BatchPlanner::new(&self.bounds, &self.config);
        planner.place_one(&mut self.state, request, index)
    }

    /// Places a batch in planner order. Results are reported in input order.
    pub fn place_batch(&mut self, requests: &[PlaceRequest]) -> BatchPlaceResult {
        let planner = BatchPlanner::new(&self.bounds, &self.config);
        let result = planner.run(&mut self.state, requests);
        log::info!(
            "batch of {}: {} placed, {} no space, {} rejected",
            result.summary.requested,
            result.summary.placed,
            result.summary.no_space,
            result.summary.input_failures()
        );
        result
    }

    /// Removes the item at `index` (placement order).
    ///
    /// The state is reset and the remaining items' original requests are
    /// replayed through the batch pipeline in placement order. Replayed items
    /// may land in different positions, or fail, compared to before.
    pub fn remove(&mut self, index: usize) -> Result<BatchPlaceResult> {
        let len = self.state.len();
        if index >= len {
            return Err(Error::InvalidIndex { index, len });
        }

        let survivors: Vec<PlaceRequest> = self
            .state
            .items()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, item)| item.request)
            .collect();

        log::info!("removing item {}; replaying {} items", index, survivors.len());
        self.state.reset(&self.bounds);
        let result = self.place_batch(&survivors);
        if !result.all_placed() {
            log::warn!(
                "{} items could not be placed again after removal",
                result.summary.failed()
            );
        }
        Ok(result)
    }

    /// Empties the pallet and the step-wise queue.
    pub fn clear(&mut self) {
        self.state.reset(&self.bounds);
        self.queue.clear();
    }

    /// Changes the support threshold for subsequent placements.
    pub fn set_support_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold(threshold)?;
        self.config.support_threshold = threshold;
        Ok(())
    }

    /// Simulates a batch against a copy of the current state.
    pub fn simulate(&self, requests: &[PlaceRequest]) -> SimulationTrace {
        SimulationEngine::new(&self.bounds, &self.config).run(&self.state, requests)
    }

    /// Re-checks the support of every placed item against the threshold in
    /// force when it was committed.
    pub fn support_report(&self) -> SupportReport {
        SupportEvaluator::from_config(&self.config)
            .audit(self.state.items(), self.bounds.pallet_top())
    }

    /// Validates requests and appends the valid ones to the step-wise queue,
    /// in the given order.
    ///
    /// Returns the rejected requests; their `index` is the position in
    /// `requests`.
    pub fn enqueue(&mut self, requests: &[PlaceRequest]) -> Vec<BatchItemResult> {
        let planner = BatchPlanner::new(&self.bounds, &self.config);
        let mut rejected = Vec::new();

        for (index, request) in requests.iter().enumerate() {
            match planner.validate(request) {
                Ok(()) => self.queue.push(index, *request),
                Err(reason) => rejected.push(BatchItemResult {
                    index,
                    request: *request,
                    result: PlaceResult::failed(reason),
                }),
            }
        }
        rejected
    }

    /// Places the oldest queued request.
    ///
    /// A request that cannot be placed is reported and dropped. Returns
    /// `None` when the queue is empty.
    pub fn place_next(&mut self) -> Option<BatchItemResult> {
        let next = self.queue.pop()?;
        let planner = BatchPlanner::new(&self.bounds, &self.config);
        let result = planner.attempt(&mut self.state, next.request, next.source_index);
        Some(BatchItemResult {
            index: next.source_index,
            request: next.request,
            result,
        })
    }

    /// Number of queued requests.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Replaces the live state with externally computed placements.
    ///
    /// Every item must lie on the deck, stay under the height limit and not
    /// interpenetrate an item listed before it. On the first violation the
    /// live state is left as it was. Each adopted item records the support it
    /// finds under the items listed before it and the current threshold.
    pub fn adopt_placements(&mut self, items: Vec<PlacedItem>) -> Result<()> {
        let eps = self.config.epsilon;
        let evaluator = SupportEvaluator::from_config(&self.config);
        let mut staged = PackingState::new(&self.bounds);

        for (i, item) in items.into_iter().enumerate() {
            if let Err(e) = self.check_foreign(&staged, &item) {
                log::warn!("rejected foreign placement {}: {}", i, e);
                return Err(e);
            }
            let support =
                evaluator.evaluate(&item.footprint(), staged.items(), self.bounds.pallet_top());
            staged.push_item(item.with_support(support.fraction, evaluator.threshold()));
        }

        let ledger = FreeSpaceLedger::from_config(&self.config);
        staged.layers = self.rebuild_layers(&staged, &ledger);
        for item in &mut staged.items {
            item.layer_index = staged
                .layers
                .iter()
                .position(|l| (l.base_elevation - item.bottom()).abs() <= eps)
                .unwrap_or(0);
        }

        log::info!(
            "adopted {} placements in {} layers",
            staged.len(),
            staged.layers.len()
        );
        self.state = staged;
        Ok(())
    }

    fn check_foreign(&self, staged: &PackingState, item: &PlacedItem) -> Result<()> {
        let eps = self.config.epsilon;
        let index = staged.len();

        if item.dimensions.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(Error::InvalidPlacement(format!(
                "item {} has non-positive extents",
                index
            )));
        }
        if !self.bounds.contains_footprint(&item.footprint(), eps) {
            return Err(Error::InvalidPlacement(format!(
                "item {} overhangs the pallet",
                index
            )));
        }
        if item.bottom() < self.bounds.pallet_top() - eps
            || item.top() > self.bounds.max_height() + eps
        {
            return Err(Error::InvalidPlacement(format!(
                "item {} spans {:.3}..{:.3}, outside {:.3}..{:.3}",
                index,
                item.bottom(),
                item.top(),
                self.bounds.pallet_top(),
                self.bounds.max_height()
            )));
        }
        if let Some(hit) = staged.spatial_index().query_aabb(&item.aabb(), eps).first() {
            return Err(Error::InvalidPlacement(format!(
                "item {} overlaps item {}",
                index, hit.index
            )));
        }
        Ok(())
    }

    /// One layer per distinct base elevation, ascending. Free space is the
    /// whole plane minus everything crossing it.
    fn rebuild_layers(&self, staged: &PackingState, ledger: &FreeSpaceLedger) -> Vec<Layer> {
        let eps = self.config.epsilon;
        let pallet_top = self.bounds.pallet_top();

        let mut bases: Vec<f64> = std::iter::once(pallet_top)
            .chain(staged.items().iter().map(PlacedItem::bottom))
            .collect();
        bases.sort_by(f64::total_cmp);
        bases.dedup_by(|a, b| (*a - *b).abs() <= eps);

        bases
            .into_iter()
            .map(|base| {
                let free_rects =
                    ledger.carve(self.bounds.surface(), staged.footprints_crossing(base, eps));
                let height = staged
                    .items()
                    .iter()
                    .filter(|item| (item.bottom() - base).abs() <= eps)
                    .map(PlacedItem::height)
                    .fold(0.0, f64::max);

                Layer::new(base, height, free_rects)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use u_pallet_core::FailureReason;

    fn packer() -> PalletPacker {
        PalletPacker::with_bounds(PalletBounds::new(80.0, 120.0, 180.0)).unwrap()
    }

    #[test]
    fn test_new_validates() {
        assert!(PalletPacker::with_bounds(PalletBounds::new(0.0, 120.0, 180.0)).is_err());
        assert!(PalletPacker::new(
            PalletBounds::new(80.0, 120.0, 180.0),
            Config::default().with_support_threshold(1.5)
        )
        .is_err());
    }

    #[test]
    fn test_place_and_utilization() {
        let mut packer = packer();
        let result = packer.place(PlaceRequest::new(80.0, 120.0, 18.0));

        assert!(result.is_success());
        assert_eq!(packer.placed_items().len(), 1);
        assert_relative_eq!(packer.utilization(), 0.1);
    }

    #[test]
    fn test_place_reports_input_failure() {
        let mut packer = packer();
        let result = packer.place(PlaceRequest::new(90.0, 10.0, 10.0));
        assert_eq!(result.failure(), Some(FailureReason::TooLarge));
        assert!(packer.placed_items().is_empty());
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut packer = packer();
        packer.place(PlaceRequest::new(10.0, 10.0, 10.0));
        let before = packer.state().clone();

        match packer.remove(3) {
            Err(Error::InvalidIndex { index, len }) => {
                assert_eq!(index, 3);
                assert_eq!(len, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(packer.state(), &before);
    }

    #[test]
    fn test_remove_replays_survivors() {
        let mut packer = packer();
        packer.place_batch(&[
            PlaceRequest::new(80.0, 60.0, 10.0),
            PlaceRequest::new(80.0, 60.0, 20.0),
            PlaceRequest::new(40.0, 40.0, 10.0),
        ]);
        assert_eq!(packer.placed_items().len(), 3);

        let replay = packer.remove(0).unwrap();
        assert!(replay.all_placed());
        assert_eq!(packer.placed_items().len(), 2);
        assert_relative_eq!(packer.placed_items()[0].height(), 20.0);
    }

    #[test]
    fn test_clear_empties_queue() {
        let mut packer = packer();
        packer.place(PlaceRequest::new(10.0, 10.0, 10.0));
        packer.enqueue(&[PlaceRequest::new(10.0, 10.0, 10.0)]);

        packer.clear();
        assert!(packer.placed_items().is_empty());
        assert_eq!(packer.layers().len(), 1);
        assert_eq!(packer.queue_len(), 0);
    }

    #[test]
    fn test_set_support_threshold() {
        let mut packer = packer();
        assert!(packer.set_support_threshold(0.5).is_ok());
        assert_relative_eq!(packer.config().support_threshold, 0.5);
        assert!(packer.set_support_threshold(1.1).is_err());
        assert_relative_eq!(packer.config().support_threshold, 0.5);
    }

    #[test]
    fn test_queue_keeps_order_and_drops_failures() {
        let mut packer = packer();
        let rejected = packer.enqueue(&[
            PlaceRequest::new(80.0, 120.0, 170.0),
            PlaceRequest::new(0.0, 1.0, 1.0),
            PlaceRequest::new(80.0, 120.0, 20.0),
            PlaceRequest::new(10.0, 10.0, 5.0),
        ]);

        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].index, 1);
        assert_eq!(packer.queue_len(), 3);

        let first = packer.place_next().unwrap();
        assert_eq!(first.index, 0);
        assert!(first.result.is_success());

        let second = packer.place_next().unwrap();
        assert_eq!(second.index, 2);
        assert_eq!(second.result.failure(), Some(FailureReason::NoSpace));

        let third = packer.place_next().unwrap();
        assert_eq!(third.index, 3);
        assert!(third.result.is_success());

        assert!(packer.place_next().is_none());
        assert_eq!(packer.placed_items().len(), 2);
    }

    #[test]
    fn test_raised_threshold_keeps_earlier_items_stable() {
        let config = Config::default().with_support_threshold(0.5);
        let mut packer = PalletPacker::new(PalletBounds::new(80.0, 120.0, 180.0), config).unwrap();
        packer.place(PlaceRequest::new(40.0, 120.0, 10.0));
        let placed = packer.place(PlaceRequest::new(60.0, 120.0, 10.0));
        assert_relative_eq!(placed.placement().unwrap().y, 10.0);

        packer.set_support_threshold(0.9).unwrap();
        let report = packer.support_report();
        assert!(report.is_all_stable());
        assert_relative_eq!(report.results[1].threshold, 0.5);
        assert_relative_eq!(report.min_support_ratio, 2.0 / 3.0, epsilon = 1e-9);

        // The raised threshold governs what comes next.
        let later = packer.place(PlaceRequest::new(80.0, 120.0, 10.0));
        assert_eq!(later.failure(), Some(FailureReason::NoSpace));
    }

    #[test]
    fn test_simulate_does_not_mutate() {
        let mut packer = packer();
        packer.place(PlaceRequest::new(80.0, 60.0, 10.0));
        let before = packer.state().clone();

        let trace = packer.simulate(&[PlaceRequest::new(80.0, 60.0, 10.0)]);
        assert_eq!(trace.summary.placed, 1);
        assert_eq!(packer.state(), &before);
    }

    #[test]
    fn test_adopt_rebuilds_layers() {
        let mut packer = packer();
        let items = vec![
            PlacedItem::from_center(Point3::new(0.0, 5.0, -30.0), 80.0, 60.0, 10.0),
            PlacedItem::from_center(Point3::new(0.0, 10.0, 30.0), 80.0, 60.0, 20.0),
            PlacedItem::from_center(Point3::new(0.0, 15.0, -30.0), 80.0, 60.0, 10.0),
        ];
        packer.adopt_placements(items).unwrap();

        let layers = packer.layers();
        assert_eq!(layers.len(), 2);
        assert_relative_eq!(layers[0].base_elevation, 0.0);
        assert_relative_eq!(layers[0].height, 20.0);
        assert!(layers[0].free_rects.is_empty());
        assert_relative_eq!(layers[1].base_elevation, 10.0);
        // The only material at 10 is covered by the item resting on it.
        assert!(layers[1].free_rects.is_empty());
        assert_eq!(packer.placed_items()[2].layer_index, 1);
        assert!(packer.support_report().is_all_stable());
        assert_relative_eq!(packer.placed_items()[2].support_ratio, 1.0);
        assert_relative_eq!(
            packer.placed_items()[2].support_threshold,
            packer.config().support_threshold
        );
    }

    #[test]
    fn test_adopt_is_all_or_nothing() {
        let mut packer = packer();
        packer.place(PlaceRequest::new(10.0, 10.0, 10.0));
        let before = packer.state().clone();

        let overlapping = vec![
            PlacedItem::from_center(Point3::new(0.0, 5.0, 0.0), 40.0, 40.0, 10.0),
            PlacedItem::from_center(Point3::new(10.0, 5.0, 0.0), 40.0, 40.0, 10.0),
        ];
        assert!(matches!(
            packer.adopt_placements(overlapping),
            Err(Error::InvalidPlacement(_))
        ));
        assert_eq!(packer.state(), &before);

        let overhanging = vec![PlacedItem::from_center(
            Point3::new(30.0, 5.0, 0.0),
            40.0,
            40.0,
            10.0,
        )];
        assert!(packer.adopt_placements(overhanging).is_err());

        let too_tall = vec![PlacedItem::from_center(
            Point3::new(0.0, 140.0, 0.0),
            10.0,
            10.0,
            100.0,
        )];
        assert!(packer.adopt_placements(too_tall).is_err());
        assert_eq!(packer.state(), &before);
    }
}
