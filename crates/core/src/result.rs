//! Placement result representation.

use crate::geometry::Orientation;
use crate::request::PlaceRequest;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why an item was not placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FailureReason {
    /// Valid item, but no layer or elevation could host it in any orientation.
    NoSpace,
    /// An extent exceeds the corresponding pallet extent.
    TooLarge,
    /// An extent is not a positive whole number.
    InvalidDimensions,
}

impl FailureReason {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSpace => "no-space",
            Self::TooLarge => "too-large",
            Self::InvalidDimensions => "invalid-dimensions",
        }
    }

    /// Returns true for failures detected before any placement attempt.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::NoSpace)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Where a committed item ended up.
///
/// `x` and `z` are the footprint center; `y` is the elevation the item rests on.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// Footprint center along x.
    pub x: f64,
    /// Base elevation.
    pub y: f64,
    /// Footprint center along z.
    pub z: f64,
    /// Index of the layer the item was committed to.
    pub layer_index: usize,
    /// True if the requested extents were permuted.
    pub rotated: bool,
    /// The orientation that was used.
    pub orientation: Orientation,
}

/// Outcome of placing one item.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "lowercase"))]
pub enum PlaceResult {
    /// The item was committed.
    Placed(Placement),
    /// The item was not committed; state is unchanged.
    Failed {
        /// Failure reason code.
        reason: FailureReason,
    },
}

impl PlaceResult {
    /// Creates a failed result.
    pub fn failed(reason: FailureReason) -> Self {
        Self::Failed { reason }
    }

    /// Returns true if the item was committed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Placed(_))
    }

    /// Returns the placement, if any.
    pub fn placement(&self) -> Option<&Placement> {
        match self {
            Self::Placed(p) => Some(p),
            Self::Failed { .. } => None,
        }
    }

    /// Returns the failure reason, if any.
    pub fn failure(&self) -> Option<FailureReason> {
        match self {
            Self::Placed(_) => None,
            Self::Failed { reason } => Some(*reason),
        }
    }
}

/// Per-item entry of a batch result.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchItemResult {
    /// Index of the request in the submitted batch.
    pub index: usize,
    /// The request as submitted.
    pub request: PlaceRequest,
    /// What happened to it.
    pub result: PlaceResult,
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchSummary {
    /// Number of requests submitted.
    pub requested: usize,
    /// Number of items committed.
    pub placed: usize,
    /// Validated items that found no space.
    pub no_space: usize,
    /// Items larger than the pallet.
    pub too_large: usize,
    /// Items with invalid extents.
    pub invalid_dimensions: usize,
}

impl BatchSummary {
    /// Records one outcome.
    pub fn record(&mut self, result: &PlaceResult) {
        self.requested += 1;
        match result.failure() {
            None => self.placed += 1,
            Some(FailureReason::NoSpace) => self.no_space += 1,
            Some(FailureReason::TooLarge) => self.too_large += 1,
            Some(FailureReason::InvalidDimensions) => self.invalid_dimensions += 1,
        }
    }

    /// Number of requests that were not placed.
    pub fn failed(&self) -> usize {
        self.requested - self.placed
    }

    /// Number of input failures.
    pub fn input_failures(&self) -> usize {
        self.too_large + self.invalid_dimensions
    }
}

/// Result of a batch placement.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchPlaceResult {
    /// One entry per submitted request, in submission order.
    pub items: Vec<BatchItemResult>,
    /// Indices of validated requests in the order they were attempted.
    pub placement_order: Vec<usize>,
    /// Aggregate counts.
    pub summary: BatchSummary,
}

impl BatchPlaceResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if every request was placed.
    pub fn all_placed(&self) -> bool {
        self.summary.placed == self.summary.requested
    }

    /// Returns the entries that were not placed.
    pub fn failures(&self) -> impl Iterator<Item = &BatchItemResult> {
        self.items.iter().filter(|item| !item.result.is_success())
    }

    /// Returns the result for the request at `index`.
    pub fn get(&self, index: usize) -> Option<&PlaceResult> {
        self.items.get(index).map(|item| &item.result)
    }
}
