//! Self-describing grid files written for each report with data.

use crate::pirep::row::PirepRow;
use anyhow::{ensure, Context};
use chrono::Datelike;
use ndarray::{Array1, Array3};
use pirepgrid::dataset::{DIMS, ROI};
use pirepgrid::{OutputGrid, MISSING};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Scalar metadata attached to every grid file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridAttributes {
    #[serde(rename = "LAT")]
    pub lat: f64,
    #[serde(rename = "LON")]
    pub lon: f64,
    /// Reported flight level in feet.
    #[serde(rename = "ALT")]
    pub alt: f64,
    /// Report time minus radar scan time, in seconds.
    #[serde(rename = "DELTA_T")]
    pub delta_t: i64,
    /// Weight-scaled turbulence label.
    #[serde(rename = "TURB")]
    pub turb: i64,
}

/// Infinite cell values, which JSON numbers cannot carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Infinity {
    #[serde(rename = "inf")]
    Positive,
    #[serde(rename = "-inf")]
    Negative,
}

/// One stored cell: a number, `"inf"`/`"-inf"`, or `null` when missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Finite(f64),
    Infinite(Infinity),
    Missing,
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            CellValue::Missing
        } else if value == f64::INFINITY {
            CellValue::Infinite(Infinity::Positive)
        } else if value == f64::NEG_INFINITY {
            CellValue::Infinite(Infinity::Negative)
        } else {
            CellValue::Finite(value)
        }
    }
}

impl CellValue {
    pub fn to_f64(self) -> f64 {
        match self {
            CellValue::Finite(value) => value,
            CellValue::Infinite(Infinity::Positive) => f64::INFINITY,
            CellValue::Infinite(Infinity::Negative) => f64::NEG_INFINITY,
            CellValue::Missing => MISSING,
        }
    }
}

/// One named variable, flattened in `(alt, lat, lon)` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataVar {
    pub name: String,
    pub values: Vec<CellValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridFile {
    pub attrs: GridAttributes,
    pub dims: Vec<String>,
    pub coords: BTreeMap<String, Vec<f64>>,
    pub data_vars: Vec<DataVar>,
}

fn flatten(name: &str, values: &Array3<f64>) -> DataVar {
    DataVar {
        name: name.to_string(),
        values: values.iter().map(|&v| CellValue::from(v)).collect(),
    }
}

impl GridFile {
    pub fn from_grid(grid: &OutputGrid, attrs: GridAttributes) -> Self {
        let coords = DIMS
            .iter()
            .filter_map(|&dim| grid.coord(dim).map(|axis| (dim.to_string(), axis.to_vec())))
            .collect();
        let mut data_vars: Vec<DataVar> = grid
            .data_vars()
            .map(|(name, values)| flatten(name, values))
            .collect();
        if let Some(roi) = grid.roi() {
            data_vars.push(flatten(ROI, roi));
        }

        Self {
            attrs,
            dims: DIMS.iter().map(|dim| dim.to_string()).collect(),
            coords,
            data_vars,
        }
    }

    /// Rebuilds the grid; `ROI` is split back out of the data variables.
    pub fn into_grid(self) -> anyhow::Result<(OutputGrid, GridAttributes)> {
        ensure!(
            self.dims.iter().map(String::as_str).eq(DIMS),
            "unexpected dimension order {:?}",
            self.dims
        );
        let mut coords = self.coords;
        let mut axis = |name: &str| {
            coords
                .remove(name)
                .map(Array1::from)
                .with_context(|| format!("grid file lacks '{}' coordinate", name))
        };
        let alt = axis(DIMS[0])?;
        let lat = axis(DIMS[1])?;
        let lon = axis(DIMS[2])?;
        let shape = (alt.len(), lat.len(), lon.len());

        let mut fields = Vec::new();
        let mut roi = None;
        for var in self.data_vars {
            let values: Vec<f64> = var.values.iter().map(|v| v.to_f64()).collect();
            let array = Array3::from_shape_vec(shape, values)
                .with_context(|| format!("'{}' does not match shape {:?}", var.name, shape))?;
            if var.name == ROI {
                roi = Some(array);
            } else {
                fields.push((var.name, array));
            }
        }

        let grid = OutputGrid::from_parts(alt, lat, lon, fields, roi)?;
        Ok((grid, self.attrs))
    }
}

/// `{id:07}_{year}_{month}_df_row.json` for the report's timestamp.
pub fn output_file_name(row: &PirepRow) -> String {
    format!(
        "{:07}_{}_{}_df_row.json",
        row.id,
        row.datetime.year(),
        row.datetime.month()
    )
}

pub fn write_grid_file(dir: &Path, name: &str, file: &GridFile) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    let path = dir.join(name);
    let contents = serde_json::to_string(file).context("serializing grid file")?;
    fs::write(&path, contents).with_context(|| format!("writing grid file {}", path.display()))?;
    Ok(path)
}

pub fn read_grid_file(path: &Path) -> anyhow::Result<GridFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading grid file {}", path.display()))?;
    let file = serde_json::from_str(&contents)
        .with_context(|| format!("parsing grid file {}", path.display()))?;
    Ok(file)
}
