//! Gridding engine that turns pooled NEXRAD gates into a regular
//! altitude × latitude × longitude grid centred on a pilot report.
//!
//! The pipeline runs four stages in order: gate extraction, per-axis cell
//! indexing, Barnes-weighted cell aggregation and dataset assembly. Each call
//! is synchronous and owns every array it creates.

pub mod dataset;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod scan;
pub mod telemetry;

pub use dataset::{GridOutcome, OutputGrid};
pub use prelude::{GridError, GridOrigin, GridResult, GridSpec, MISSING};
pub use processing::create_grid;
pub use scan::{GateScan, MomentFilter, RadarScan};
