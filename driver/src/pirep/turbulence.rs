use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest intensity a pilot can report.
pub const MAX_REPORTED_INTENSITY: i64 = 7;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TurbulenceError {
    #[error("turbulence intensity {0} is outside 0..=7")]
    IntensityOutOfRange(i64),
    #[error("plane weight must be 'L', 'M', 'H' or 'U', got '{0}'")]
    UnknownWeight(String),
}

/// ICAO wake turbulence category of the reporting aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaneWeight {
    #[serde(rename = "L")]
    Light,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "H")]
    Heavy,
    #[serde(rename = "U")]
    Unknown,
}

impl PlaneWeight {
    /// Intensity steps added to a report from this category.
    ///
    /// Unknown aircraft are almost all small one-off planes, so they are left
    /// unchanged like light ones.
    pub fn adjustment(self) -> i64 {
        match self {
            PlaneWeight::Light | PlaneWeight::Unknown => 0,
            PlaneWeight::Medium => 1,
            PlaneWeight::Heavy => 2,
        }
    }
}

impl FromStr for PlaneWeight {
    type Err = TurbulenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "L" => Ok(PlaneWeight::Light),
            "M" => Ok(PlaneWeight::Medium),
            "H" => Ok(PlaneWeight::Heavy),
            "U" => Ok(PlaneWeight::Unknown),
            other => Err(TurbulenceError::UnknownWeight(other.to_string())),
        }
    }
}

impl fmt::Display for PlaneWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            PlaneWeight::Light => "L",
            PlaneWeight::Medium => "M",
            PlaneWeight::Heavy => "H",
            PlaneWeight::Unknown => "U",
        };
        f.write_str(code)
    }
}

/// Scales a pilot-reported intensity by the aircraft's weight category.
///
/// The result is not clamped, so heavy aircraft can yield labels above 7.
pub fn scale_turbulence(intensity: i64, weight: PlaneWeight) -> Result<i64, TurbulenceError> {
    if !(0..=MAX_REPORTED_INTENSITY).contains(&intensity) {
        return Err(TurbulenceError::IntensityOutOfRange(intensity));
    }
    Ok(intensity + weight.adjustment())
}
