use crate::dataset::OutputGrid;
use crate::prelude::{GridResult, GridSpec};
use crate::processing::aggregate::CellAggregates;

/// Attaches coordinate axes and field names to the aggregated arrays.
pub fn assemble_grid(spec: &GridSpec, aggregates: CellAggregates) -> GridResult<OutputGrid> {
    let [alt, lat, lon] = spec.axes();
    let data_vars = spec
        .fields
        .iter()
        .cloned()
        .zip(aggregates.values)
        .collect();

    OutputGrid::from_parts(
        alt.coordinates(),
        lat.coordinates(),
        lon.coordinates(),
        data_vars,
        aggregates.roi,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{GridOrigin, MISSING};
    use ndarray::Array3;

    #[test]
    fn assembled_grid_carries_coordinates_and_fields() {
        let spec = GridSpec {
            grid_shape: [2, 3, 4],
            alt_range: (0.0, 2000.0),
            lat_range: (-0.3, 0.3),
            lon_range: (-0.4, 0.4),
            grid_origin: GridOrigin::new(1000.0, 40.0, -100.0),
            fields: vec!["reflectivity".into(), "spectrum_width".into()],
            map_roi: true,
        };
        let aggregates = CellAggregates {
            values: vec![
                Array3::from_elem((2, 3, 4), 12.0),
                Array3::from_elem((2, 3, 4), MISSING),
            ],
            roi: Some(Array3::from_elem((2, 3, 4), 500.0)),
            missing_cells: 0,
        };

        let grid = assemble_grid(&spec, aggregates).unwrap();
        assert_eq!(grid.shape(), [2, 3, 4]);
        assert_eq!(grid.alt().to_vec(), vec![1500.0, 2500.0]);
        assert!((grid.lat()[1] - 40.0).abs() < 1e-12);
        assert!(grid.lon().to_vec().windows(2).all(|w| w[1] > w[0]));
        assert_eq!(
            grid.field_names().collect::<Vec<_>>(),
            vec!["reflectivity", "spectrum_width"]
        );
        assert_eq!(grid.field("reflectivity").unwrap()[[1, 2, 3]], 12.0);
        assert!(grid.roi().is_some());
    }
}
