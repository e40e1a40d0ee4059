use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source of per-gate radar samples.
///
/// Every slice is indexed by the same flattened gate index. Longitude and
/// latitude are in degrees, altitude in meters. `gate_included` carries the
/// scan's own quality decision for each gate.
pub trait RadarScan {
    fn name(&self) -> &str;
    fn gate_longitude(&self) -> &[f64];
    fn gate_latitude(&self) -> &[f64];
    fn gate_altitude(&self) -> &[f64];
    fn gate_included(&self) -> &[bool];
    fn field(&self, name: &str) -> Option<&[f64]>;

    fn gate_count(&self) -> usize {
        self.gate_longitude().len()
    }
}

impl<T: RadarScan + ?Sized> RadarScan for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn gate_longitude(&self) -> &[f64] {
        (**self).gate_longitude()
    }

    fn gate_latitude(&self) -> &[f64] {
        (**self).gate_latitude()
    }

    fn gate_altitude(&self) -> &[f64] {
        (**self).gate_altitude()
    }

    fn gate_included(&self) -> &[bool] {
        (**self).gate_included()
    }

    fn field(&self, name: &str) -> Option<&[f64]> {
        (**self).field(name)
    }

    fn gate_count(&self) -> usize {
        (**self).gate_count()
    }
}

/// Flattened in-memory volume scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateScan {
    pub name: String,
    pub longitude: Vec<f64>,
    pub latitude: Vec<f64>,
    pub altitude: Vec<f64>,
    pub included: Vec<bool>,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<f64>>,
    /// Radar site longitude as recorded in the volume header, when known.
    #[serde(default)]
    pub site_longitude: Option<f64>,
}

impl GateScan {
    /// Creates a scan with every gate marked as included and no fields.
    pub fn new(
        name: impl Into<String>,
        longitude: Vec<f64>,
        latitude: Vec<f64>,
        altitude: Vec<f64>,
    ) -> Self {
        let included = vec![true; longitude.len()];
        Self {
            name: name.into(),
            longitude,
            latitude,
            altitude,
            included,
            fields: BTreeMap::new(),
            site_longitude: None,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.fields.insert(name.into(), values);
        self
    }

    pub fn with_site_longitude(mut self, longitude: f64) -> Self {
        self.site_longitude = Some(longitude);
        self
    }

    /// Some archived volumes record a site longitude of 0 and store gate
    /// longitudes relative to the site. Shifts those gates by the true site
    /// longitude and returns whether anything changed.
    pub fn repair_longitude(&mut self, site_longitude: f64) -> bool {
        if self.site_longitude != Some(0.0) {
            return false;
        }
        for lon in &mut self.longitude {
            *lon += site_longitude;
        }
        self.site_longitude = Some(site_longitude);
        true
    }

    /// Marks a gate as failing the quality check.
    pub fn exclude(&mut self, gate: usize) {
        if let Some(flag) = self.included.get_mut(gate) {
            *flag = false;
        }
    }

    pub fn included_count(&self) -> usize {
        self.included.iter().filter(|&&flag| flag).count()
    }
}

impl RadarScan for GateScan {
    fn name(&self) -> &str {
        &self.name
    }

    fn gate_longitude(&self) -> &[f64] {
        &self.longitude
    }

    fn gate_latitude(&self) -> &[f64] {
        &self.latitude
    }

    fn gate_altitude(&self) -> &[f64] {
        &self.altitude
    }

    fn gate_included(&self) -> &[bool] {
        &self.included
    }

    fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(Vec::as_slice)
    }
}
