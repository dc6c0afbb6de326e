//! JSON adapter between external inputs and the U-Pallet engine.
//!
//! Decodes request lists and grid-cell solver results, and shapes engine
//! output into serializable reports. The engine itself never sees JSON.

pub mod adapter;
pub mod report;

pub use adapter::{decode_requests, solver_placements, CellPlacement, SolverResult};
pub use report::{ImportReport, PackReport};
