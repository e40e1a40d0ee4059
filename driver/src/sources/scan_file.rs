use anyhow::Context;
use pirepgrid::{GateScan, MomentFilter};
use std::fs;
use std::path::Path;

/// Reads a decoded volume scan and applies the optional quality filter.
pub fn read_scan(path: &Path, quality: Option<&MomentFilter>) -> anyhow::Result<GateScan> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading radar scan {}", path.display()))?;
    let mut scan: GateScan = serde_json::from_str(&contents)
        .with_context(|| format!("parsing radar scan {}", path.display()))?;
    if let Some(filter) = quality {
        filter
            .apply(&mut scan)
            .with_context(|| format!("filtering radar scan {}", path.display()))?;
    }
    Ok(scan)
}

pub fn write_scan(path: &Path, scan: &GateScan) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string(scan).context("serializing radar scan")?;
    fs::write(path, contents).with_context(|| format!("writing radar scan {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scan_round_trips_and_filters_on_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("KTLX20130520_201643_V06.json");
        let scan = GateScan::new("KTLX", vec![-97.3, -97.2], vec![35.3, 35.4], vec![900.0, 1200.0])
            .with_field("reflectivity", vec![-32.0, 41.5]);
        write_scan(&path, &scan).unwrap();

        assert_eq!(read_scan(&path, None).unwrap(), scan);
        let filtered = read_scan(&path, Some(&MomentFilter::default())).unwrap();
        assert_eq!(filtered.included, vec![false, true]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = read_scan(&dir.path().join("absent.json"), None).unwrap_err();
        assert!(format!("{:#}", err).contains("reading radar scan"));
    }
}
