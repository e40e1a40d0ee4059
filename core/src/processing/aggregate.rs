use crate::math::geo::haversine;
use crate::math::stats::StatsHelper;
use crate::math::weights::barnes2_weight;
use crate::prelude::{GridSpec, MISSING};
use crate::processing::extract::GateSet;
use crate::processing::index::{Axis, GridMasks};
use ndarray::Array3;

/// Per-cell weighted averages, one array per requested field.
#[derive(Debug, Clone, PartialEq)]
pub struct CellAggregates {
    pub values: Vec<Array3<f64>>,
    pub roi: Option<Array3<f64>>,
    pub missing_cells: usize,
}

/// Absolute center and upper corner of one cell.
#[derive(Debug, Clone, Copy)]
struct CellGeometry {
    alt: f64,
    lat: f64,
    lon: f64,
    alt_max: f64,
    lat_max: f64,
    lon_max: f64,
}

impl CellGeometry {
    fn new(axes: &[Axis; 3], index: [usize; 3]) -> Self {
        let [alt, lat, lon] = axes;
        Self {
            alt: alt.absolute_center(index[0]),
            lat: lat.absolute_center(index[1]),
            lon: lon.absolute_center(index[2]),
            alt_max: alt.absolute_bounds(index[0]).1,
            lat_max: lat.absolute_bounds(index[1]).1,
            lon_max: lon.absolute_bounds(index[2]).1,
        }
    }

    /// Squared distance from the center to the far corner.
    fn radius_of_influence2(&self) -> f64 {
        let xy = haversine(self.lat, self.lon, self.lat_max, self.lon_max);
        xy.powi(2) + (self.alt_max - self.alt).powi(2)
    }

    /// Squared 3D distance from the center to a gate.
    fn distance2(&self, lat: f64, lon: f64, alt: f64) -> f64 {
        let xy = haversine(self.lat, self.lon, lat, lon);
        // Squared from the rooted total; stored grids depend on this rounding.
        let total = (xy.powi(2) + (alt - self.alt).powi(2)).sqrt();
        total.powi(2)
    }
}

/// Member gate of one cell with its squared distance and Barnes weight.
#[derive(Debug, Clone, Copy)]
struct Member {
    gate: usize,
    dist2: f64,
    weight: f64,
}

/// Weighted mean of one field over a cell's members.
///
/// Members are summed nearest-first (ties broken by value) so the result does
/// not depend on the order gates were pooled in.
fn weighted_field_mean(members: &[Member], field: &[f64]) -> f64 {
    let mut samples: Vec<(f64, f64, f64)> = members
        .iter()
        .map(|member| (member.dist2, member.weight, field[member.gate]))
        .collect();
    samples.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.2.total_cmp(&b.2)));

    let values: Vec<f64> = samples.iter().map(|sample| sample.2).collect();
    let weights: Vec<f64> = samples.iter().map(|sample| sample.1).collect();
    StatsHelper::weighted_mean(&values, &weights).unwrap_or(MISSING)
}

/// Averages every cell's member gates with Barnes-2 weights.
///
/// Empty cells keep the `MISSING` sentinel. The radius of influence is written
/// for every cell when `spec.map_roi` is set, whether or not it has members.
pub fn aggregate_cells(spec: &GridSpec, gates: &GateSet, masks: &GridMasks) -> CellAggregates {
    let axes = spec.axes();
    let [n_alt, n_lat, n_lon] = spec.grid_shape;
    let shape = (n_alt, n_lat, n_lon);

    let mut values = vec![Array3::from_elem(shape, MISSING); gates.fields.len()];
    let mut roi = spec.map_roi.then(|| Array3::from_elem(shape, MISSING));
    let mut missing_cells = 0;

    let mut band: Vec<usize> = Vec::new();
    let mut members: Vec<Member> = Vec::new();
    for iz in 0..n_alt {
        for iy in 0..n_lat {
            // Gates in this altitude/latitude band, shared by the whole row of longitudes.
            band.clear();
            band.extend(
                (0..gates.len())
                    .filter(|&g| masks.alt.contains(iz, g) && masks.lat.contains(iy, g)),
            );

            for ix in 0..n_lon {
                let cell = CellGeometry::new(&axes, [iz, iy, ix]);
                let r2 = cell.radius_of_influence2();
                if let Some(roi) = roi.as_mut() {
                    roi[[iz, iy, ix]] = r2.sqrt();
                }

                members.clear();
                let in_cell = band.iter().filter(|&&g| masks.lon.contains(ix, g));
                members.extend(in_cell.map(|&g| {
                    let dist2 = cell.distance2(gates.lat[g], gates.lon[g], gates.alt[g]);
                    Member {
                        gate: g,
                        dist2,
                        weight: barnes2_weight(dist2, r2),
                    }
                }));

                if members.is_empty() {
                    missing_cells += 1;
                    continue;
                }
                for (grid, field) in values.iter_mut().zip(&gates.fields) {
                    grid[[iz, iy, ix]] = weighted_field_mean(&members, field);
                }
            }
        }
    }

    CellAggregates {
        values,
        roi,
        missing_cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::weights::BARNES_EPSILON;
    use crate::prelude::{is_missing, GridOrigin};

    fn spec(shape: [usize; 3], map_roi: bool) -> GridSpec {
        GridSpec {
            grid_shape: shape,
            alt_range: (-100.0, 100.0),
            lat_range: (-0.02, 0.02),
            lon_range: (-0.02, 0.02),
            grid_origin: GridOrigin::default(),
            fields: vec!["reflectivity".into()],
            map_roi,
        }
    }

    fn gate_set(points: &[(f64, f64, f64, f64)]) -> GateSet {
        GateSet {
            lat: points.iter().map(|p| p.0).collect(),
            lon: points.iter().map(|p| p.1).collect(),
            alt: points.iter().map(|p| p.2).collect(),
            fields: vec![points.iter().map(|p| p.3).collect()],
        }
    }

    fn run(spec: &GridSpec, gates: &GateSet) -> CellAggregates {
        let masks = GridMasks::build(spec, gates).unwrap();
        aggregate_cells(spec, gates, &masks)
    }

    #[test]
    fn single_member_cell_keeps_its_value() {
        let spec = spec([1, 1, 1], false);
        let gates = gate_set(&[(0.013, -0.007, 42.0, 37.25)]);
        let result = run(&spec, &gates);
        assert_eq!(result.values[0][[0, 0, 0]], 37.25);
        assert_eq!(result.missing_cells, 0);
    }

    #[test]
    fn gate_at_center_outweighs_farther_gates() {
        let cell = CellGeometry::new(&spec([1, 1, 1], false).axes(), [0, 0, 0]);
        let r2 = cell.radius_of_influence2();
        let center = cell.distance2(0.0, 0.0, 0.0);
        assert_eq!(center, 0.0);
        assert_eq!(barnes2_weight(center, r2), 1.0 + BARNES_EPSILON);
        let near = barnes2_weight(cell.distance2(0.001, 0.0, 0.0), r2);
        let far = barnes2_weight(cell.distance2(0.015, 0.015, 90.0), r2);
        assert!(near < 1.0 + BARNES_EPSILON);
        assert!(far < near);
    }

    #[test]
    fn empty_cells_are_missing_but_keep_roi() {
        let spec = spec([1, 2, 2], true);
        let gates = gate_set(&[(-0.01, -0.01, 0.0, 15.0)]);
        let result = run(&spec, &gates);

        assert_eq!(result.values[0][[0, 0, 0]], 15.0);
        assert!(is_missing(result.values[0][[0, 0, 1]]));
        assert!(is_missing(result.values[0][[0, 1, 0]]));
        assert!(is_missing(result.values[0][[0, 1, 1]]));
        assert_eq!(result.missing_cells, 3);

        let roi = result.roi.unwrap();
        assert!(roi.iter().all(|r| r.is_finite() && *r > 100.0));
    }

    #[test]
    fn roi_matches_far_corner_distance() {
        let spec = spec([1, 1, 1], true);
        let gates = gate_set(&[(0.0, 0.0, 0.0, 1.0)]);
        let result = run(&spec, &gates);
        let xy = haversine(0.0, 0.0, 0.02, 0.02);
        let expected = (xy * xy + 100.0 * 100.0).sqrt();
        assert!((result.roi.unwrap()[[0, 0, 0]] - expected).abs() < 1e-9);
    }

    #[test]
    fn roi_is_absent_unless_requested() {
        let spec = spec([1, 1, 1], false);
        let result = run(&spec, &gate_set(&[(0.0, 0.0, 0.0, 1.0)]));
        assert!(result.roi.is_none());
    }

    #[test]
    fn all_empty_cells_give_fully_missing_grid() {
        let spec = spec([2, 1, 1], false);
        let gates = gate_set(&[(0.5, 0.5, 0.0, 9.0)]);
        let result = run(&spec, &gates);
        assert_eq!(result.missing_cells, 2);
        assert!(result.values[0].iter().all(|v| is_missing(*v)));
    }

    #[test]
    fn result_does_not_depend_on_gate_order() {
        let spec = spec([1, 1, 1], false);
        let points = [
            (0.011, -0.004, 12.0, 31.5),
            (-0.002, 0.009, -40.0, 18.25),
            (0.0005, 0.0007, 3.0, 44.0),
            (-0.017, -0.013, 80.0, 7.75),
            (0.006, 0.016, -75.0, 25.0),
        ];
        let forward = run(&spec, &gate_set(&points));
        let mut reversed_points = points;
        reversed_points.reverse();
        let reversed = run(&spec, &gate_set(&reversed_points));
        let rotated_points = [points[2], points[4], points[0], points[3], points[1]];
        let rotated = run(&spec, &gate_set(&rotated_points));

        let value = forward.values[0][[0, 0, 0]];
        assert_eq!(value.to_bits(), reversed.values[0][[0, 0, 0]].to_bits());
        assert_eq!(value.to_bits(), rotated.values[0][[0, 0, 0]].to_bits());
    }
}
