//! Batch validation, ordering and placement.

use crate::boundary::PalletBounds;
use crate::orientation::OrientationResolver;
use crate::search::PlacementSearch;
use crate::state::PackingState;
use std::cmp::Ordering;
use u_pallet_core::{
    BatchItemResult, BatchPlaceResult, Config, FailureReason, PlaceRequest, PlaceResult,
};

/// Validates, orders and places batches of requests.
///
/// Ordering rules:
/// 1. requests with a horizontal extent exactly equal to the pallet width,
/// 2. then descending plan-view area of the requested extents,
/// 3. then submission order.
#[derive(Debug, Clone, Copy)]
pub struct BatchPlanner<'a> {
    bounds: &'a PalletBounds,
    config: &'a Config,
    resolver: OrientationResolver,
}

impl<'a> BatchPlanner<'a> {
    /// Creates a planner for the given pallet and configuration.
    pub fn new(bounds: &'a PalletBounds, config: &'a Config) -> Self {
        Self {
            bounds,
            config,
            resolver: OrientationResolver::new(config.orientation),
        }
    }

    /// Checks a request before any placement attempt.
    ///
    /// Extents are compared per axis against the pallet width, depth and
    /// usable height.
    pub fn validate(&self, request: &PlaceRequest) -> Result<(), FailureReason> {
        if !request.has_valid_extents() {
            return Err(FailureReason::InvalidDimensions);
        }

        let eps = self.config.epsilon;
        if request.width > self.bounds.width() + eps
            || request.depth > self.bounds.depth() + eps
            || request.height > self.bounds.usable_height() + eps
        {
            return Err(FailureReason::TooLarge);
        }
        Ok(())
    }

    /// Sorts request indices into placement order.
    pub fn order(&self, requests: &[PlaceRequest], indices: &mut [usize]) {
        let pallet_width = self.bounds.width();
        let spans_width = |r: &PlaceRequest| {
            (r.width - pallet_width).abs() <= self.config.epsilon
                || (r.depth - pallet_width).abs() <= self.config.epsilon
        };

        // `sort_by` is stable, so equal keys keep submission order.
        indices.sort_by(|&a, &b| {
            let (ra, rb) = (&requests[a], &requests[b]);
            match (spans_width(ra), spans_width(rb)) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => rb.footprint_area().total_cmp(&ra.footprint_area()),
            }
        });
    }

    /// Validates and places a single request, trying every orientation.
    pub fn place_one(
        &self,
        state: &mut PackingState,
        request: PlaceRequest,
        source_index: usize,
    ) -> PlaceResult {
        if let Err(reason) = self.validate(&request) {
            return PlaceResult::failed(reason);
        }
        self.attempt(state, request, source_index)
    }

    /// Places an already validated request.
    pub(crate) fn attempt(
        &self,
        state: &mut PackingState,
        request: PlaceRequest,
        source_index: usize,
    ) -> PlaceResult {
        let search = PlacementSearch::new(self.bounds, self.config);
        let orientations = self.resolver.resolve(&request);

        match search.place(state, request, &orientations, source_index) {
            Some(placement) => PlaceResult::Placed(placement),
            None => {
                log::debug!(
                    "no space for item {} ({} x {} x {})",
                    source_index,
                    request.width,
                    request.depth,
                    request.height
                );
                PlaceResult::failed(FailureReason::NoSpace)
            }
        }
    }

    /// Runs the batch pipeline over `state` and returns the placement order.
    ///
    /// Input failures are passed to `record` first, in input order, without
    /// being attempted. The valid requests are then attempted in planner order
    /// and each outcome is passed to `record` together with the state after
    /// the attempt.
    pub fn drive<F>(
        &self,
        state: &mut PackingState,
        requests: &[PlaceRequest],
        mut record: F,
    ) -> Vec<usize>
    where
        F: FnMut(usize, PlaceResult, &PackingState),
    {
        let mut valid = Vec::with_capacity(requests.len());
        for (i, request) in requests.iter().enumerate() {
            match self.validate(request) {
                Ok(()) => valid.push(i),
                Err(reason) => {
                    log::debug!("rejected request {}: {}", i, reason);
                    record(i, PlaceResult::failed(reason), state);
                }
            }
        }

        self.order(requests, &mut valid);
        for &i in &valid {
            let result = self.attempt(state, requests[i], i);
            record(i, result, state);
        }
        valid
    }

    /// Places a batch: input failures are reported without attempting them,
    /// the rest are attempted in planner order.
    pub fn run(&self, state: &mut PackingState, requests: &[PlaceRequest]) -> BatchPlaceResult {
        let mut results: Vec<Option<PlaceResult>> = vec![None; requests.len()];
        let order = self.drive(state, requests, |i, result, _| results[i] = Some(result));

        let mut batch = BatchPlaceResult::new();
        batch.placement_order = order;
        for (index, (request, result)) in requests.iter().zip(results).enumerate() {
            let result = result.unwrap_or(PlaceResult::failed(FailureReason::NoSpace));
            batch.summary.record(&result);
            batch.items.push(BatchItemResult {
                index,
                request: *request,
                result,
            });
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pallet() -> PalletBounds {
        PalletBounds::new(80.0, 120.0, 180.0)
    }

    #[test]
    fn test_validate() {
        let bounds = pallet();
        let config = Config::default();
        let planner = BatchPlanner::new(&bounds, &config);

        assert_eq!(planner.validate(&PlaceRequest::new(80.0, 120.0, 180.0)), Ok(()));
        assert_eq!(
            planner.validate(&PlaceRequest::new(90.0, 10.0, 10.0)),
            Err(FailureReason::TooLarge)
        );
        assert_eq!(
            planner.validate(&PlaceRequest::new(10.0, 10.0, 181.0)),
            Err(FailureReason::TooLarge)
        );
        assert_eq!(
            planner.validate(&PlaceRequest::new(0.0, 10.0, 10.0)),
            Err(FailureReason::InvalidDimensions)
        );
        assert_eq!(
            planner.validate(&PlaceRequest::new(10.5, 10.0, 10.0)),
            Err(FailureReason::InvalidDimensions)
        );
    }

    #[test]
    fn test_validate_uses_usable_height() {
        let bounds = pallet().with_deck_height(15.0);
        let config = Config::default();
        let planner = BatchPlanner::new(&bounds, &config);

        assert_eq!(
            planner.validate(&PlaceRequest::new(10.0, 10.0, 170.0)),
            Err(FailureReason::TooLarge)
        );
        assert_eq!(planner.validate(&PlaceRequest::new(10.0, 10.0, 165.0)), Ok(()));
    }

    #[test]
    fn test_order_full_width_first_then_area() {
        let bounds = pallet();
        let config = Config::default();
        let planner = BatchPlanner::new(&bounds, &config);

        let requests = vec![
            PlaceRequest::new(50.0, 50.0, 10.0),
            PlaceRequest::new(20.0, 20.0, 10.0),
            PlaceRequest::new(40.0, 80.0, 10.0),
            PlaceRequest::new(60.0, 60.0, 10.0),
            PlaceRequest::new(50.0, 50.0, 5.0),
        ];
        let mut indices: Vec<usize> = (0..requests.len()).collect();
        planner.order(&requests, &mut indices);

        assert_eq!(indices, vec![2, 3, 0, 4, 1]);
    }

    #[test]
    fn test_oversized_never_attempted() {
        let bounds = pallet();
        let config = Config::default();
        let planner = BatchPlanner::new(&bounds, &config);
        let mut state = PackingState::new(&bounds);

        let result = planner.run(&mut state, &[PlaceRequest::new(90.0, 10.0, 10.0)]);

        assert_eq!(result.get(0).and_then(PlaceResult::failure), Some(FailureReason::TooLarge));
        assert!(result.placement_order.is_empty());
        assert!(state.is_empty());
        assert_eq!(result.summary.too_large, 1);
    }

    #[test]
    fn test_run_reports_in_input_order() {
        let bounds = pallet();
        let config = Config::default();
        let planner = BatchPlanner::new(&bounds, &config);
        let mut state = PackingState::new(&bounds);

        let requests = vec![
            PlaceRequest::new(20.0, 20.0, 10.0),
            PlaceRequest::new(-1.0, 20.0, 10.0),
            PlaceRequest::new(80.0, 60.0, 10.0),
        ];
        let result = planner.run(&mut state, &requests);

        assert_eq!(result.items.len(), 3);
        assert_eq!(result.placement_order, vec![2, 0]);
        assert!(result.items[0].result.is_success());
        assert_eq!(
            result.items[1].result.failure(),
            Some(FailureReason::InvalidDimensions)
        );
        assert!(result.items[2].result.is_success());
        assert_eq!(result.summary.placed, 2);
        assert_eq!(state.items()[0].source_index, 2);
    }

    #[test]
    fn test_drive_reports_failures_then_attempts() {
        let bounds = pallet();
        let config = Config::default();
        let planner = BatchPlanner::new(&bounds, &config);
        let mut state = PackingState::new(&bounds);

        let requests = vec![
            PlaceRequest::new(20.0, 20.0, 10.0),
            PlaceRequest::new(90.0, 20.0, 10.0),
            PlaceRequest::new(80.0, 60.0, 10.0),
        ];
        let mut seen = Vec::new();
        let order = planner.drive(&mut state, &requests, |i, result, state| {
            seen.push((i, result.is_success(), state.len()));
        });

        assert_eq!(order, vec![2, 0]);
        assert_eq!(seen, vec![(1, false, 0), (2, true, 1), (0, true, 2)]);
    }

    #[test]
    fn test_rotation_fallback() {
        let bounds = PalletBounds::new(80.0, 120.0, 180.0);
        let config = Config::default();
        let planner = BatchPlanner::new(&bounds, &config);
        let mut state = PackingState::new(&bounds);

        assert!(planner.place_one(&mut state, PlaceRequest::new(80.0, 100.0, 175.0), 0).is_success());
        // Only an 80 x 20 strip is left and nothing fits on top; 20 x 80 must
        // be turned.
        let result = planner.place_one(&mut state, PlaceRequest::new(20.0, 80.0, 10.0), 1);
        let placement = result.placement().unwrap();
        assert!(placement.rotated);
        assert_eq!(placement.layer_index, 0);
    }

    #[test]
    fn test_no_space_leaves_state_untouched() {
        let bounds = pallet();
        let config = Config::default();
        let planner = BatchPlanner::new(&bounds, &config);
        let mut state = PackingState::new(&bounds);

        planner.place_one(&mut state, PlaceRequest::new(80.0, 120.0, 150.0), 0);
        let before = state.clone();
        let result = planner.place_one(&mut state, PlaceRequest::new(80.0, 120.0, 40.0), 1);

        assert_eq!(result.failure(), Some(FailureReason::NoSpace));
        assert_eq!(state, before);
    }
}
