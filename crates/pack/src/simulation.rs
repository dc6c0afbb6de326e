//! Non-mutating what-if placement.
//!
//! The engine clones the live [`PackingState`] and runs the batch pipeline
//! against the copy, recording a snapshot of every layer's free rectangles
//! after each step. Placed items are part of the clone, so items simulated
//! earlier in a run support and block later ones exactly as a real batch
//! would.

use crate::boundary::PalletBounds;
use crate::planner::BatchPlanner;
use crate::state::PackingState;
use u_pallet_core::{BatchSummary, Config, PlaceRequest, PlaceResult, Rect2D};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One simulated request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationStep {
    /// Index of the request in the simulated batch.
    pub index: usize,
    /// Requested extents.
    pub request: PlaceRequest,
    /// Outcome, including the chosen orientation and position on success.
    pub result: PlaceResult,
    /// Free rectangles of each layer after this step.
    pub free_rects: Vec<Vec<Rect2D>>,
}

impl SimulationStep {
    /// Returns true if the request would be placed.
    pub fn success(&self) -> bool {
        self.result.is_success()
    }
}

/// Ordered trace of a simulation run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationTrace {
    /// Input failures first, then attempts in placement order.
    pub steps: Vec<SimulationStep>,
    /// Aggregate counts.
    pub summary: BatchSummary,
}

impl SimulationTrace {
    /// Steps that would not be placed.
    pub fn failures(&self) -> impl Iterator<Item = &SimulationStep> {
        self.steps.iter().filter(|s| !s.success())
    }

    fn push(&mut self, index: usize, request: PlaceRequest, result: PlaceResult, state: &PackingState) {
        self.summary.record(&result);
        self.steps.push(SimulationStep {
            index,
            request,
            result,
            free_rects: state.free_rect_snapshot(),
        });
    }
}

/// Runs batches against a copy of the live state.
#[derive(Debug, Clone, Copy)]
pub struct SimulationEngine<'a> {
    bounds: &'a PalletBounds,
    config: &'a Config,
}

impl<'a> SimulationEngine<'a> {
    /// Creates an engine for the given pallet and configuration.
    pub fn new(bounds: &'a PalletBounds, config: &'a Config) -> Self {
        Self { bounds, config }
    }

    /// Simulates placing `requests` on top of `live`.
    pub fn run(&self, live: &PackingState, requests: &[PlaceRequest]) -> SimulationTrace {
        let mut state = live.clone();
        let mut trace = SimulationTrace::default();
        BatchPlanner::new(self.bounds, self.config).drive(
            &mut state,
            requests,
            |index, result, state| trace.push(index, requests[index], result, state),
        );

        log::debug!(
            "simulated {} requests: {} placed",
            trace.summary.requested,
            trace.summary.placed
        );
        trace
    }
}
