//! Labeled output of the gridding engine.

use crate::prelude::{is_missing, GridError, GridResult};
use ndarray::{Array1, Array3};

pub const ALT: &str = "alt";
pub const LAT: &str = "lat";
pub const LON: &str = "lon";
/// Name of the optional radius-of-influence variable.
pub const ROI: &str = "ROI";
/// Dimension order shared by every data variable.
pub const DIMS: [&str; 3] = [ALT, LAT, LON];

/// Gridded dataset with `alt`/`lat`/`lon` coordinates and one array per field.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGrid {
    alt: Array1<f64>,
    lat: Array1<f64>,
    lon: Array1<f64>,
    data_vars: Vec<(String, Array3<f64>)>,
    roi: Option<Array3<f64>>,
}

impl OutputGrid {
    /// Builds a grid, checking that every array matches the coordinate lengths.
    pub fn from_parts(
        alt: Array1<f64>,
        lat: Array1<f64>,
        lon: Array1<f64>,
        data_vars: Vec<(String, Array3<f64>)>,
        roi: Option<Array3<f64>>,
    ) -> GridResult<Self> {
        let shape = [alt.len(), lat.len(), lon.len()];
        if data_vars.is_empty() {
            return Err(GridError::Shape("a grid needs at least one field".into()));
        }
        let named = data_vars
            .iter()
            .map(|(name, values)| (name.as_str(), values))
            .chain(roi.as_ref().map(|values| (ROI, values)));
        for (name, values) in named {
            if values.shape() != &shape[..] {
                return Err(GridError::Shape(format!(
                    "'{}' has shape {:?}, coordinates imply {:?}",
                    name,
                    values.shape(),
                    shape
                )));
            }
        }

        Ok(Self {
            alt,
            lat,
            lon,
            data_vars,
            roi,
        })
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.alt.len(), self.lat.len(), self.lon.len()]
    }

    pub fn alt(&self) -> &Array1<f64> {
        &self.alt
    }

    pub fn lat(&self) -> &Array1<f64> {
        &self.lat
    }

    pub fn lon(&self) -> &Array1<f64> {
        &self.lon
    }

    /// Coordinate axis by name.
    pub fn coord(&self, name: &str) -> Option<&Array1<f64>> {
        match name {
            ALT => Some(&self.alt),
            LAT => Some(&self.lat),
            LON => Some(&self.lon),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Array3<f64>> {
        self.data_vars
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, values)| values)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.data_vars.iter().map(|(name, _)| name.as_str())
    }

    /// Data variables in request order.
    pub fn data_vars(&self) -> impl Iterator<Item = (&str, &Array3<f64>)> {
        self.data_vars.iter().map(|(name, values)| (name.as_str(), values))
    }

    pub fn roi(&self) -> Option<&Array3<f64>> {
        self.roi.as_ref()
    }

    /// Number of cells where every field is missing.
    pub fn missing_count(&self) -> usize {
        let [n_alt, n_lat, n_lon] = self.shape();
        let mut missing = 0;
        for iz in 0..n_alt {
            for iy in 0..n_lat {
                for ix in 0..n_lon {
                    if self
                        .data_vars
                        .iter()
                        .all(|(_, values)| is_missing(values[[iz, iy, ix]]))
                    {
                        missing += 1;
                    }
                }
            }
        }
        missing
    }

    /// False when every cell is missing.
    pub fn has_data(&self) -> bool {
        self.missing_count() < self.shape().iter().product()
    }
}

/// Result of a gridding request: a grid, or nothing in range.
#[derive(Debug, Clone, PartialEq)]
pub enum GridOutcome {
    Grid(OutputGrid),
    NoData,
}

impl GridOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, GridOutcome::NoData)
    }

    pub fn grid(&self) -> Option<&OutputGrid> {
        match self {
            GridOutcome::Grid(grid) => Some(grid),
            GridOutcome::NoData => None,
        }
    }

    pub fn into_grid(self) -> Option<OutputGrid> {
        match self {
            GridOutcome::Grid(grid) => Some(grid),
            GridOutcome::NoData => None,
        }
    }
}
