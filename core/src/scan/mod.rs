pub mod filter;
pub mod source;

pub use filter::MomentFilter;
pub use source::{GateScan, RadarScan};
