use crate::dataset::{ALT, LAT, LON, ROI};
use crate::processing::index::Axis;
use serde::{Deserialize, Serialize};

/// Value stored in a cell that no gate fell into.
pub const MISSING: f64 = f64::NAN;

/// Returns true when `value` is the missing-cell sentinel.
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Absolute reference point of a grid, usually a PIREP location.
///
/// Altitude is in meters, latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GridOrigin {
    pub alt: f64,
    pub lat: f64,
    pub lon: f64,
}

impl GridOrigin {
    pub fn new(alt: f64, lat: f64, lon: f64) -> Self {
        Self { alt, lat, lon }
    }
}

/// Immutable request describing the grid to build.
///
/// Ranges are `(min_offset, max_offset)` pairs relative to `grid_origin`;
/// `grid_shape` counts cells along altitude, latitude and longitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub grid_shape: [usize; 3],
    pub alt_range: (f64, f64),
    pub lat_range: (f64, f64),
    pub lon_range: (f64, f64),
    pub grid_origin: GridOrigin,
    pub fields: Vec<String>,
    pub map_roi: bool,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            grid_shape: [10, 16, 16],
            alt_range: (-1524.0, 1524.0),
            lat_range: (-0.125, 0.125),
            lon_range: (-0.125, 0.125),
            grid_origin: GridOrigin::default(),
            fields: vec!["reflectivity".to_string()],
            map_roi: false,
        }
    }
}

impl GridSpec {
    /// Same layout centred on another point.
    pub fn with_origin(&self, origin: GridOrigin) -> Self {
        Self {
            grid_origin: origin,
            ..self.clone()
        }
    }

    /// The three axes in `(alt, lat, lon)` order.
    pub fn axes(&self) -> [Axis; 3] {
        let [n_alt, n_lat, n_lon] = self.grid_shape;
        [
            Axis::new(ALT, n_alt, self.alt_range, self.grid_origin.alt),
            Axis::new(LAT, n_lat, self.lat_range, self.grid_origin.lat),
            Axis::new(LON, n_lon, self.lon_range, self.grid_origin.lon),
        ]
    }

    /// Absolute center of the cell at `[iz, iy, ix]`.
    pub fn cell_center(&self, index: [usize; 3]) -> GridOrigin {
        let [alt, lat, lon] = self.axes();
        GridOrigin::new(
            alt.absolute_center(index[0]),
            lat.absolute_center(index[1]),
            lon.absolute_center(index[2]),
        )
    }

    /// Total cells; only meaningful once `validate` has passed.
    pub fn cell_count(&self) -> usize {
        self.grid_shape.iter().product()
    }

    /// Checks the request before any gate is touched.
    pub fn validate(&self) -> GridResult<()> {
        if self.fields.is_empty() {
            return Err(GridError::Configuration(
                "at least one field must be requested".into(),
            ));
        }

        for (idx, name) in self.fields.iter().enumerate() {
            if name.is_empty() {
                return Err(GridError::Configuration("field names cannot be empty".into()));
            }
            if [ALT, LAT, LON].contains(&name.as_str()) || (self.map_roi && name == ROI) {
                return Err(GridError::Configuration(format!(
                    "field name '{}' is reserved",
                    name
                )));
            }
            if self.fields[..idx].contains(name) {
                return Err(GridError::Configuration(format!(
                    "field '{}' requested more than once",
                    name
                )));
            }
        }

        for axis in self.axes() {
            axis.check()?;
        }

        let bytes = self
            .grid_shape
            .iter()
            .try_fold(std::mem::size_of::<f64>(), |acc, &n| acc.checked_mul(n));
        if !matches!(bytes, Some(bytes) if bytes <= isize::MAX as usize) {
            return Err(GridError::Configuration(format!(
                "grid shape {:?} is too large to allocate",
                self.grid_shape
            )));
        }

        let origin = self.grid_origin;
        if !(origin.alt.is_finite() && origin.lat.is_finite() && origin.lon.is_finite()) {
            return Err(GridError::Configuration(format!(
                "grid origin {:?} is not finite",
                origin
            )));
        }

        Ok(())
    }
}

/// Common error type for the gridding engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid scan: {0}")]
    InvalidScan(String),
    #[error("shape mismatch: {0}")]
    Shape(String),
}

pub type GridResult<T> = Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_spec() -> GridSpec {
        GridSpec {
            grid_shape: [1, 1, 1],
            alt_range: (-100.0, 100.0),
            lat_range: (-0.02, 0.02),
            lon_range: (-0.02, 0.02),
            grid_origin: GridOrigin::new(3000.0, 39.5, -98.25),
            fields: vec!["reflectivity".into()],
            map_roi: false,
        }
    }

    #[test]
    fn default_spec_is_valid() {
        assert!(GridSpec::default().validate().is_ok());
        assert_eq!(GridSpec::default().cell_count(), 10 * 16 * 16);
    }

    #[test]
    fn single_cell_center_is_the_origin() {
        let spec = unit_spec();
        assert_eq!(spec.cell_center([0, 0, 0]), spec.grid_origin);
    }

    #[test]
    fn empty_fields_are_rejected() {
        let spec = GridSpec {
            fields: Vec::new(),
            ..unit_spec()
        };
        assert!(matches!(spec.validate(), Err(GridError::Configuration(_))));
    }

    #[test]
    fn zero_cell_count_is_rejected() {
        let spec = GridSpec {
            grid_shape: [1, 0, 1],
            ..unit_spec()
        };
        assert!(matches!(spec.validate(), Err(GridError::Configuration(_))));
    }

    #[test]
    fn oversized_shape_is_rejected() {
        let overflowing = GridSpec {
            grid_shape: [usize::MAX / 2, 4, 1],
            ..unit_spec()
        };
        let too_big = GridSpec {
            grid_shape: [1 << 30, 1 << 30, 1 << 4],
            ..unit_spec()
        };
        assert!(matches!(
            overflowing.validate(),
            Err(GridError::Configuration(_))
        ));
        assert!(matches!(too_big.validate(), Err(GridError::Configuration(_))));
    }

    #[test]
    fn inverted_or_flat_ranges_are_rejected() {
        let inverted = GridSpec {
            lat_range: (0.02, -0.02),
            ..unit_spec()
        };
        let flat = GridSpec {
            alt_range: (50.0, 50.0),
            ..unit_spec()
        };
        assert!(matches!(inverted.validate(), Err(GridError::Configuration(_))));
        assert!(matches!(flat.validate(), Err(GridError::Configuration(_))));
    }

    #[test]
    fn reserved_and_duplicate_field_names_are_rejected() {
        let reserved = GridSpec {
            fields: vec!["lat".into()],
            ..unit_spec()
        };
        let duplicate = GridSpec {
            fields: vec!["reflectivity".into(), "reflectivity".into()],
            ..unit_spec()
        };
        assert!(reserved.validate().is_err());
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn non_finite_origin_is_rejected() {
        let spec = unit_spec().with_origin(GridOrigin::new(f64::NAN, 0.0, 0.0));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn spec_deserializes_with_defaults() {
        let spec: GridSpec =
            serde_json::from_str(r#"{"grid_shape": [2, 4, 4], "map_roi": true}"#).unwrap();
        assert_eq!(spec.grid_shape, [2, 4, 4]);
        assert!(spec.map_roi);
        assert_eq!(spec.fields, vec!["reflectivity".to_string()]);
        assert_eq!(spec.alt_range, (-1524.0, 1524.0));
    }
}
