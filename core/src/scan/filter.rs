use crate::prelude::{GridError, GridResult};
use crate::scan::source::GateScan;
use log::debug;
use serde::{Deserialize, Serialize};

/// Threshold filter on one moment, ANDed into a scan's quality flags.
///
/// Gates whose value is non-finite or outside `[min, max]` are excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentFilter {
    pub field: String,
    pub min: f64,
    pub max: f64,
}

impl Default for MomentFilter {
    fn default() -> Self {
        Self {
            field: "reflectivity".to_string(),
            min: -20.0,
            max: 100.0,
        }
    }
}

impl MomentFilter {
    /// Applies the filter in place and returns how many gates it newly excluded.
    pub fn apply(&self, scan: &mut GateScan) -> GridResult<usize> {
        let values = scan.fields.get(&self.field).ok_or_else(|| {
            GridError::Configuration(format!(
                "filter field '{}' missing from scan '{}'",
                self.field, scan.name
            ))
        })?;
        if values.len() != scan.included.len() {
            return Err(GridError::InvalidScan(format!(
                "scan '{}' has {} '{}' values for {} gates",
                scan.name,
                values.len(),
                self.field,
                scan.included.len()
            )));
        }

        let mut excluded = 0;
        for (flag, &value) in scan.included.iter_mut().zip(values) {
            let keep = value.is_finite() && value >= self.min && value <= self.max;
            if *flag && !keep {
                *flag = false;
                excluded += 1;
            }
        }

        debug!(
            "moment filter on '{}' excluded {} gates from {}",
            self.field, excluded, scan.name
        );
        Ok(excluded)
    }
}
