use crate::prelude::{GridError, GridResult, GridSpec};
use crate::processing::extract::GateSet;
use ndarray::{Array1, Array2, ArrayView1};

/// One grid axis: `n` cells evenly spanning `[start, stop)` relative to `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub name: &'static str,
    pub n: usize,
    pub start: f64,
    pub stop: f64,
    pub origin: f64,
}

impl Axis {
    pub fn new(name: &'static str, n: usize, range: (f64, f64), origin: f64) -> Self {
        Self {
            name,
            n,
            start: range.0,
            stop: range.1,
            origin,
        }
    }

    pub fn check(&self) -> GridResult<()> {
        if self.n == 0 {
            return Err(GridError::Configuration(format!(
                "{} axis needs at least one cell",
                self.name
            )));
        }
        if !(self.start.is_finite() && self.stop.is_finite()) {
            return Err(GridError::Configuration(format!(
                "{} range ({}, {}) is not finite",
                self.name, self.start, self.stop
            )));
        }
        if self.stop <= self.start {
            return Err(GridError::Configuration(format!(
                "{} range stop {} must exceed start {}",
                self.name, self.stop, self.start
            )));
        }
        Ok(())
    }

    pub fn step(&self) -> f64 {
        (self.stop - self.start) / self.n as f64
    }

    /// Center of cell `i` relative to the origin.
    pub fn relative_center(&self, i: usize) -> f64 {
        let step = self.step();
        (self.start + step / 2.0) + step * i as f64
    }

    pub fn absolute_center(&self, i: usize) -> f64 {
        self.relative_center(i) + self.origin
    }

    /// Absolute `[min, max)` interval of cell `i`.
    pub fn absolute_bounds(&self, i: usize) -> (f64, f64) {
        let center = self.relative_center(i);
        let half = self.step() / 2.0;
        (center - half + self.origin, center + half + self.origin)
    }

    /// Absolute `[min, max)` span of the whole axis.
    pub fn absolute_extent(&self) -> (f64, f64) {
        (self.start + self.origin, self.stop + self.origin)
    }

    /// Ascending absolute cell centers.
    pub fn coordinates(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.n, |i| self.absolute_center(i))
    }

    /// Index of the cell whose interval holds `value`.
    pub fn cell_of(&self, value: f64) -> Option<usize> {
        (0..self.n).find(|&i| {
            let (min, max) = self.absolute_bounds(i);
            min <= value && value < max
        })
    }
}

/// Per-cell membership masks for one axis, shape `(n, num_gates)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisMasks {
    masks: Array2<bool>,
}

impl AxisMasks {
    pub fn build(axis: &Axis, values: &[f64]) -> GridResult<Self> {
        axis.check()?;

        let mut masks = Array2::from_elem((axis.n, values.len()), false);
        for (i, mut row) in masks.outer_iter_mut().enumerate() {
            let (min, max) = axis.absolute_bounds(i);
            for (flag, &value) in row.iter_mut().zip(values) {
                *flag = min <= value && value < max;
            }
        }
        Ok(Self { masks })
    }

    pub fn cell_count(&self) -> usize {
        self.masks.nrows()
    }

    pub fn gate_count(&self) -> usize {
        self.masks.ncols()
    }

    pub fn mask(&self, cell: usize) -> ArrayView1<'_, bool> {
        self.masks.row(cell)
    }

    pub fn contains(&self, cell: usize, gate: usize) -> bool {
        self.masks[[cell, gate]]
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.masks
    }
}

/// Masks for all three axes of a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMasks {
    pub alt: AxisMasks,
    pub lat: AxisMasks,
    pub lon: AxisMasks,
}

impl GridMasks {
    pub fn build(spec: &GridSpec, gates: &GateSet) -> GridResult<Self> {
        let [alt, lat, lon] = spec.axes();
        Ok(Self {
            alt: AxisMasks::build(&alt, &gates.alt)?,
            lat: AxisMasks::build(&lat, &gates.lat)?,
            lon: AxisMasks::build(&lon, &gates.lon)?,
        })
    }
}
