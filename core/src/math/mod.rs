pub mod geo;
pub mod stats;
pub mod weights;

pub use geo::haversine;
pub use stats::StatsHelper;
pub use weights::barnes2_weight;
