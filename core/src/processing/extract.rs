use crate::prelude::{GridError, GridResult, GridSpec};
use crate::scan::RadarScan;
use log::debug;

/// Gates that passed the quality and bounding-box filters, pooled across scans.
///
/// All vectors are aligned index-for-index; `fields[k]` holds the values of
/// the k-th requested field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateSet {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub alt: Vec<f64>,
    pub fields: Vec<Vec<f64>>,
}

impl GateSet {
    fn with_fields(count: usize) -> Self {
        Self {
            fields: vec![Vec::new(); count],
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_empty()
    }
}

fn check_scan<S: RadarScan>(scan: &S, fields: &[String]) -> GridResult<()> {
    let gates = scan.gate_count();
    let lengths = [
        ("latitude", scan.gate_latitude().len()),
        ("altitude", scan.gate_altitude().len()),
        ("quality flags", scan.gate_included().len()),
    ];
    for (what, len) in lengths {
        if len != gates {
            return Err(GridError::InvalidScan(format!(
                "scan '{}' has {} {} entries for {} gates",
                scan.name(),
                len,
                what,
                gates
            )));
        }
    }

    for name in fields {
        let values = scan.field(name).ok_or_else(|| {
            GridError::Configuration(format!(
                "field '{}' missing from scan '{}'",
                name,
                scan.name()
            ))
        })?;
        if values.len() != gates {
            return Err(GridError::InvalidScan(format!(
                "scan '{}' has {} '{}' values for {} gates",
                scan.name(),
                values.len(),
                name,
                gates
            )));
        }
    }
    Ok(())
}

fn within(bounds: (f64, f64), value: f64) -> bool {
    bounds.0 <= value && value < bounds.1
}

/// Pools every included gate inside the grid's absolute bounding box.
///
/// Gates keep scan order, then in-scan order. Every scan is checked before any
/// gate is copied.
pub fn extract_gates<S: RadarScan>(scans: &[S], spec: &GridSpec) -> GridResult<GateSet> {
    if scans.is_empty() {
        return Err(GridError::Configuration(
            "at least one radar scan is required".into(),
        ));
    }
    for scan in scans {
        check_scan(scan, &spec.fields)?;
    }

    let [alt_axis, lat_axis, lon_axis] = spec.axes();
    let alt_bounds = alt_axis.absolute_extent();
    let lat_bounds = lat_axis.absolute_extent();
    let lon_bounds = lon_axis.absolute_extent();

    let mut gates = GateSet::with_fields(spec.fields.len());
    for scan in scans {
        let lon = scan.gate_longitude();
        let lat = scan.gate_latitude();
        let alt = scan.gate_altitude();
        let included = scan.gate_included();
        let field_values = spec
            .fields
            .iter()
            .map(|name| {
                scan.field(name).ok_or_else(|| {
                    GridError::Configuration(format!("field '{}' missing from scan", name))
                })
            })
            .collect::<GridResult<Vec<_>>>()?;

        let before = gates.len();
        for gate in 0..scan.gate_count() {
            let keep = included[gate]
                && within(lon_bounds, lon[gate])
                && within(lat_bounds, lat[gate])
                && within(alt_bounds, alt[gate]);
            if !keep {
                continue;
            }
            gates.lon.push(lon[gate]);
            gates.lat.push(lat[gate]);
            gates.alt.push(alt[gate]);
            for (pooled, values) in gates.fields.iter_mut().zip(&field_values) {
                pooled.push(values[gate]);
            }
        }
        debug!(
            "scan {} kept {} of {} gates",
            scan.name(),
            gates.len() - before,
            scan.gate_count()
        );
    }

    Ok(gates)
}
