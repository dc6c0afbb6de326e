//! # U-Pallet Pack
//!
//! Layer-based online 3D packing of rectangular items onto a single pallet.
//!
//! Items are placed one at a time or in batches. Each placement searches the
//! existing layers bottom-up for a free rectangle the item fits in, checks
//! that it would rest on enough material, and opens a new layer on top of
//! placed items when nothing else fits.
//!
//! ## Features
//!
//! - Per-layer free-space ledger with four-way split and pruning
//! - Support evaluation with a configurable threshold and a centroid test
//! - Orientation modes (Fixed, Upright, Any)
//! - Deterministic batch ordering, step-wise queue and non-mutating simulation
//! - Removal by reset and replay, adoption of externally computed placements
//!
//! ## Quick Start
//!
//! ```rust
//! use u_pallet_pack::{PalletBounds, PalletPacker, PlaceRequest};
//!
//! let bounds = PalletBounds::new(80.0, 120.0, 180.0);
//! let mut packer = PalletPacker::with_bounds(bounds).unwrap();
//!
//! let result = packer.place_batch(&[
//!     PlaceRequest::new(80.0, 60.0, 10.0),
//!     PlaceRequest::new(80.0, 60.0, 10.0),
//! ]);
//!
//! assert!(result.all_placed());
//! assert_eq!(packer.layers().len(), 1);
//! ```

pub mod boundary;
pub mod ledger;
pub mod orientation;
pub mod packer;
pub mod planner;
pub mod queue;
pub mod search;
pub mod simulation;
pub mod spatial_index;
pub mod stability;
pub mod state;

// Re-exports
pub use boundary::PalletBounds;
pub use ledger::{CandidateScore, FreeRect, FreeSpaceLedger, Layer};
pub use orientation::OrientationResolver;
pub use packer::PalletPacker;
pub use planner::BatchPlanner;
pub use queue::{PlacementQueue, QueuedRequest};
pub use search::{Candidate, CandidateTarget, PlacementSearch};
pub use simulation::{SimulationEngine, SimulationStep, SimulationTrace};
pub use spatial_index::{Aabb3D, SpatialEntry3D, SpatialIndex3D};
pub use stability::{SupportAudit, SupportEvaluator, SupportInfo, SupportReport};
pub use state::{PackingState, PlacedItem};
pub use u_pallet_core::{
    BatchItemResult, BatchPlaceResult, BatchSummary, Config, Error, FailureReason, Orientation,
    OrientationMode, PlaceRequest, PlaceResult, Placement, Rect2D, Result,
};
