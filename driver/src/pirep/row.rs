use anyhow::Context;
use chrono::NaiveDateTime;
use pirepgrid::GridOrigin;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const FEET_PER_METER: f64 = 3.281;

pub fn ft_to_meters(feet: f64) -> f64 {
    feet / FEET_PER_METER
}

/// One cleaned turbulence report with the radar files matched to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PirepRow {
    pub id: u64,
    pub datetime: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
    /// Reported flight level in feet.
    pub flight_level_ft: f64,
    pub turbulence_intensity: i64,
    /// Wake category code (`L`, `M`, `H` or `U`), parsed per row.
    pub plane_weight: String,
    /// Radar files ordered nearest first.
    pub radar_files: Vec<PathBuf>,
}

impl PirepRow {
    /// Grid origin at the report's position and altitude.
    pub fn origin(&self) -> GridOrigin {
        GridOrigin::new(ft_to_meters(self.flight_level_ft), self.lat, self.lon)
    }
}

/// Reads a JSON array of rows.
pub fn load_rows<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<PirepRow>> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading PIREP rows {}", path_ref.display()))?;
    let rows: Vec<PirepRow> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing PIREP rows {}", path_ref.display()))?;
    Ok(rows)
}
