//! Decoding of request lists and solver results.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use u_pallet_core::{Orientation, PlaceRequest};
use u_pallet_pack::{PalletBounds, PlacedItem};

/// Decodes a JSON array of `{width, depth, height}` objects.
///
/// Extents may be numbers or numeric strings. Missing or unparsable extents
/// decode to NaN, which the engine reports as invalid dimensions for that
/// entry instead of rejecting the whole list.
pub fn decode_requests(json: &str) -> Result<Vec<PlaceRequest>> {
    let value: Value = serde_json::from_str(json).context("request list is not valid JSON")?;
    let Value::Array(entries) = value else {
        bail!("expected an array of objects with width, depth and height");
    };

    Ok(entries
        .iter()
        .map(|entry| {
            PlaceRequest::new(
                extent(entry, "width"),
                extent(entry, "depth"),
                extent(entry, "height"),
            )
        })
        .collect())
}

fn extent(entry: &Value, key: &str) -> f64 {
    match entry.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// One item placed by a grid-cell solver.
///
/// Coordinates and extents are in grid cells from the pallet's minimum
/// corner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CellPlacement {
    /// Index into the request list the solver was given.
    pub index: usize,
    /// First cell along x.
    pub x: f64,
    /// First cell along z.
    pub z: f64,
    /// Cells covered along x.
    pub w: f64,
    /// Cells covered along z.
    pub d: f64,
    /// Solver layer, counted from the pallet up.
    #[serde(default)]
    pub layer: usize,
}

/// A solver result file: `{"placed": [...]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SolverResult {
    /// Placed items.
    pub placed: Vec<CellPlacement>,
}

impl SolverResult {
    /// Parses a solver result.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("solver result must be an object with a `placed` array")
    }
}

/// Converts solver cells into placed items.
///
/// Layer 0 rests on the pallet top; each higher layer rests on the tallest
/// item of the layer below it. Entries referring to unknown requests are
/// skipped.
pub fn solver_placements(
    result: &SolverResult,
    requests: &[PlaceRequest],
    bounds: &PalletBounds,
    grid: f64,
) -> Vec<PlacedItem> {
    let mut layer_height: BTreeMap<usize, f64> = BTreeMap::new();
    for cell in &result.placed {
        if let Some(request) = requests.get(cell.index) {
            let h = layer_height.entry(cell.layer).or_insert(0.0);
            *h = h.max(request.height);
        }
    }

    let top_layer = layer_height.keys().next_back().copied().unwrap_or(0);
    let mut bases = vec![bounds.pallet_top()];
    for layer in 1..=top_layer {
        let below = layer_height.get(&(layer - 1)).copied().unwrap_or(0.0);
        bases.push(bases[layer - 1] + below);
    }

    let min_x = -bounds.width() / 2.0;
    let min_z = -bounds.depth() / 2.0;

    result
        .placed
        .iter()
        .filter_map(|cell| {
            let Some(request) = requests.get(cell.index) else {
                log::warn!("solver refers to unknown request {}", cell.index);
                return None;
            };
            let base = bases.get(cell.layer).copied()?;
            let cx = min_x + (cell.x + cell.w / 2.0) * grid;
            let cz = min_z + (cell.z + cell.d / 2.0) * grid;

            Some(PlacedItem::resting_at(
                cx,
                base,
                cz,
                *request,
                cell_orientation(request, cell, grid),
                cell.index,
                cell.layer,
            ))
        })
        .collect()
}

/// Upright orientation matching the cell span: swapped when the cell's x
/// span is closer to the requested depth than to the requested width.
fn cell_orientation(request: &PlaceRequest, cell: &CellPlacement, grid: f64) -> Orientation {
    let extents = request.extents();
    let span_x = cell.w * grid;
    if (span_x - request.depth).abs() < (span_x - request.width).abs() {
        Orientation::from_axes(1, (1, 0, 2), &extents)
    } else {
        Orientation::identity(&extents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use u_pallet_pack::PalletPacker;

    #[test]
    fn test_decode_requests() {
        let requests = decode_requests(
            r#"[{"width": 40, "depth": 60, "height": 20},
                {"width": "30", "depth": "20", "height": "10"},
                {"width": 10, "depth": 10}]"#,
        )
        .unwrap();

        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0], PlaceRequest::new(40.0, 60.0, 20.0));
        assert_eq!(requests[1], PlaceRequest::new(30.0, 20.0, 10.0));
        assert!(requests[2].height.is_nan());
        assert!(!requests[2].has_valid_extents());
    }

    #[test]
    fn test_decode_rejects_non_array() {
        assert!(decode_requests(r#"{"width": 1}"#).is_err());
        assert!(decode_requests("not json").is_err());
    }

    #[test]
    fn test_solver_layers_and_centres() {
        let bounds = PalletBounds::new(80.0, 120.0, 180.0).with_deck_height(5.0);
        let requests = vec![
            PlaceRequest::new(40.0, 60.0, 20.0),
            PlaceRequest::new(40.0, 60.0, 30.0),
            PlaceRequest::new(60.0, 40.0, 10.0),
        ];
        let result = SolverResult::from_json(
            r#"{"placed": [
                {"index": 0, "x": 0, "z": 0, "w": 8, "d": 12, "layer": 0},
                {"index": 1, "x": 8, "z": 0, "w": 8, "d": 12, "layer": 0},
                {"index": 2, "x": 0, "z": 0, "w": 8, "d": 12, "layer": 1},
                {"index": 7, "x": 0, "z": 0, "w": 1, "d": 1}
            ]}"#,
        )
        .unwrap();

        let items = solver_placements(&result, &requests, &bounds, 5.0);
        assert_eq!(items.len(), 3);

        assert_relative_eq!(items[0].position.x, -20.0);
        assert_relative_eq!(items[0].position.z, -30.0);
        assert_relative_eq!(items[0].bottom(), 5.0);
        assert_relative_eq!(items[1].position.x, 20.0);

        // Layer 1 rests on the tallest item of layer 0.
        assert_relative_eq!(items[2].bottom(), 35.0);
        assert!(items[2].orientation.is_rotated());
        assert_relative_eq!(items[2].width(), 40.0);
    }

    #[test]
    fn test_solver_items_adopt_cleanly() {
        let bounds = PalletBounds::new(80.0, 120.0, 180.0);
        let requests = vec![
            PlaceRequest::new(40.0, 120.0, 20.0),
            PlaceRequest::new(40.0, 120.0, 20.0),
            PlaceRequest::new(80.0, 60.0, 10.0),
        ];
        let result = SolverResult {
            placed: vec![
                CellPlacement { index: 0, x: 0.0, z: 0.0, w: 8.0, d: 24.0, layer: 0 },
                CellPlacement { index: 1, x: 8.0, z: 0.0, w: 8.0, d: 24.0, layer: 0 },
                CellPlacement { index: 2, x: 0.0, z: 0.0, w: 16.0, d: 12.0, layer: 1 },
            ],
        };

        let items = solver_placements(&result, &requests, &bounds, 5.0);
        let mut packer = PalletPacker::with_bounds(bounds).unwrap();
        packer.adopt_placements(items).unwrap();

        assert_eq!(packer.placed_items().len(), 3);
        assert_eq!(packer.layers().len(), 2);
        assert_relative_eq!(packer.layers()[1].base_elevation, 20.0);
        assert_relative_eq!(packer.layers()[1].free_area(), 80.0 * 60.0);
    }
}
