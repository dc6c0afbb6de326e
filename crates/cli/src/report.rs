//! Serializable summaries printed by the CLI.

use serde::Serialize;
use u_pallet_core::{BatchItemResult, BatchPlaceResult, BatchSummary};
use u_pallet_pack::{PalletPacker, PlacedItem, SupportReport};

/// Outcome of a `pack` run.
#[derive(Debug, Clone, Serialize)]
pub struct PackReport {
    /// Aggregate counts over every submitted request.
    pub summary: BatchSummary,
    /// Per-request outcomes in input order.
    pub results: Vec<BatchItemResult>,
    /// Items on the pallet at the end of the run.
    pub placed: Vec<PlacedItem>,
    /// Number of layers.
    pub layers: usize,
    /// Placed volume over usable pallet volume.
    pub utilization: f64,
}

impl PackReport {
    /// Builds a report from a finished batch.
    pub fn from_batch(packer: &PalletPacker, batch: BatchPlaceResult) -> Self {
        Self::new(packer, batch.summary, batch.items)
    }

    /// Builds a report from individually collected results.
    pub fn new(packer: &PalletPacker, summary: BatchSummary, results: Vec<BatchItemResult>) -> Self {
        Self {
            summary,
            results,
            placed: packer.placed_items().to_vec(),
            layers: packer.layers().len(),
            utilization: packer.utilization(),
        }
    }
}

/// Outcome of an `import-solver` run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Items adopted.
    pub adopted: usize,
    /// Layers rebuilt from the adopted items.
    pub layers: usize,
    /// Placed volume over usable pallet volume.
    pub utilization: f64,
    /// Support audit of the adopted items.
    pub support: SupportReport,
}

impl ImportReport {
    /// Summarizes the packer after adoption.
    pub fn new(packer: &PalletPacker) -> Self {
        Self {
            adopted: packer.placed_items().len(),
            layers: packer.layers().len(),
            utilization: packer.utilization(),
            support: packer.support_report(),
        }
    }
}
