//! The four gridding stages and the `create_grid` entry point chaining them.

pub mod aggregate;
pub mod assemble;
pub mod extract;
pub mod index;

pub use aggregate::{aggregate_cells, CellAggregates};
pub use assemble::assemble_grid;
pub use extract::{extract_gates, GateSet};
pub use index::{Axis, AxisMasks, GridMasks};

use crate::dataset::GridOutcome;
use crate::prelude::{GridResult, GridSpec};
use crate::scan::RadarScan;
use crate::telemetry::LogManager;

/// Grids the pooled gates of `scans` onto the cells described by `spec`.
///
/// Configuration problems are reported before any gate is read. When no gate
/// survives the quality and bounding-box filters the result is
/// [`GridOutcome::NoData`]; a grid whose cells are all empty is still
/// returned as a grid.
pub fn create_grid<S: RadarScan>(scans: &[S], spec: &GridSpec) -> GridResult<GridOutcome> {
    let logger = LogManager::scoped("create_grid");
    spec.validate()?;

    let gates = extract_gates(scans, spec)?;
    let total: usize = scans.iter().map(|scan| scan.gate_count()).sum();
    logger.detail(&format!(
        "filtering {} gates to {} inside the grid",
        total,
        gates.len()
    ));
    if gates.is_empty() {
        logger.detail("no gates in range, returning no data");
        return Ok(GridOutcome::NoData);
    }

    let masks = GridMasks::build(spec, &gates)?;
    let aggregates = aggregate_cells(spec, &gates, &masks);
    logger.detail(&format!(
        "{}/{} cells are missing",
        aggregates.missing_cells,
        spec.cell_count()
    ));

    Ok(GridOutcome::Grid(assemble_grid(spec, aggregates)?))
}
