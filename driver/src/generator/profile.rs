use crate::pirep::row::PirepRow;
use crate::pirep::turbulence::PlaneWeight;
use crate::sources::scan_file::write_scan;
use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use pirepgrid::math::geo::{haversine, EARTH_RADIUS_M};
use pirepgrid::GateScan;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Effective earth radius used for beam height (4/3 model).
const EFFECTIVE_EARTH_RADIUS_M: f64 = 4.0 / 3.0 * 6_371_000.0;

/// Gaussian reflectivity core placed in the synthetic volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StormCell {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub radius_m: f64,
    pub peak_dbz: f64,
}

impl Default for StormCell {
    fn default() -> Self {
        Self {
            lat: 35.45,
            lon: -97.2,
            alt: 4000.0,
            radius_m: 12_000.0,
            peak_dbz: 55.0,
        }
    }
}

/// Configuration for generating a synthetic volume scan and matching reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub site: String,
    pub site_lat: f64,
    pub site_lon: f64,
    pub site_alt: f64,
    pub scan_time: NaiveDateTime,
    pub elevations_deg: Vec<f64>,
    pub rays: usize,
    pub gates: usize,
    pub first_gate_m: f64,
    pub gate_spacing_m: f64,
    pub storm: StormCell,
    pub noise: f64,
    pub seed: u64,
    pub reports: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let scan_time = NaiveDate::from_ymd_opt(2013, 5, 20)
            .and_then(|date| date.and_hms_opt(20, 16, 43))
            .unwrap_or_default();
        Self {
            site: "KTLX".to_string(),
            site_lat: 35.333,
            site_lon: -97.278,
            site_alt: 370.0,
            scan_time,
            elevations_deg: vec![0.5, 1.5, 2.4, 3.4, 4.3, 6.0],
            rays: 360,
            gates: 240,
            first_gate_m: 2125.0,
            gate_spacing_m: 250.0,
            storm: StormCell::default(),
            noise: 2.0,
            seed: 0,
            reports: 16,
        }
    }
}

impl GeneratorConfig {
    /// Archive-style file name carrying the scan time.
    pub fn scan_file_name(&self) -> String {
        format!("{}{}_V06.json", self.site, self.scan_time.format("%Y%m%d_%H%M%S"))
    }
}

/// Height above the antenna and ground distance of a gate, in meters.
fn beam_geometry(range_m: f64, elevation_deg: f64) -> (f64, f64) {
    let r = EFFECTIVE_EARTH_RADIUS_M;
    let elevation = elevation_deg.to_radians();
    let height = (range_m.powi(2) + r.powi(2) + 2.0 * range_m * r * elevation.sin()).sqrt() - r;
    let ground = r * (range_m * elevation.cos() / (r + height)).asin();
    (height, ground)
}

/// Builds a flattened volume scan with reflectivity and spectrum width fields.
pub fn build_scan(config: &GeneratorConfig) -> anyhow::Result<GateScan> {
    let per_sweep = config
        .rays
        .checked_mul(config.gates)
        .context("overflow computing gates per sweep")?;
    let total = per_sweep
        .checked_mul(config.elevations_deg.len())
        .context("overflow computing gates per volume")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut longitude = Vec::with_capacity(total);
    let mut latitude = Vec::with_capacity(total);
    let mut altitude = Vec::with_capacity(total);
    let mut reflectivity = Vec::with_capacity(total);
    let mut spectrum_width = Vec::with_capacity(total);

    let storm = &config.storm;
    let cos_site = config.site_lat.to_radians().cos();
    for &elevation in &config.elevations_deg {
        for ray in 0..config.rays {
            let azimuth = (ray as f64 * 360.0 / config.rays as f64).to_radians();
            for gate in 0..config.gates {
                let range = config.first_gate_m + config.gate_spacing_m * gate as f64;
                let (height, ground) = beam_geometry(range, elevation);
                let lat = config.site_lat + (ground * azimuth.cos() / EARTH_RADIUS_M).to_degrees();
                let lon = config.site_lon
                    + (ground * azimuth.sin() / (EARTH_RADIUS_M * cos_site)).to_degrees();
                let alt = config.site_alt + height;

                let horizontal = haversine(lat, lon, storm.lat, storm.lon);
                let distance2 = horizontal.powi(2) + (alt - storm.alt).powi(2);
                let core = (-distance2 / (2.0 * storm.radius_m.powi(2))).exp();

                let jitter = if config.noise > 0.0 {
                    rng.gen_range(-config.noise..config.noise)
                } else {
                    0.0
                };
                longitude.push(lon);
                latitude.push(lat);
                altitude.push(alt);
                reflectivity.push(-30.0 + (storm.peak_dbz + 30.0) * core + jitter);
                spectrum_width.push(0.5 + 6.0 * core + jitter.abs() / 4.0);
            }
        }
    }

    Ok(GateScan::new(config.site.clone(), longitude, latitude, altitude)
        .with_site_longitude(config.site_lon)
        .with_field("reflectivity", reflectivity)
        .with_field("spectrum_width", spectrum_width))
}

/// Random reports scattered around the storm, all matched to `scan_path`.
pub fn build_reports(config: &GeneratorConfig, scan_path: &Path) -> Vec<PirepRow> {
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));
    let weights = [
        PlaneWeight::Light,
        PlaneWeight::Medium,
        PlaneWeight::Heavy,
        PlaneWeight::Unknown,
    ];

    (0..config.reports)
        .map(|id| {
            let weight = weights[rng.gen_range(0..weights.len())];
            PirepRow {
                id: id as u64,
                datetime: config.scan_time + Duration::seconds(rng.gen_range(0..900)),
                lat: config.storm.lat + rng.gen_range(-0.3..0.3),
                lon: config.storm.lon + rng.gen_range(-0.3..0.3),
                flight_level_ft: rng.gen_range(6_000.0..24_000.0),
                turbulence_intensity: rng.gen_range(0..=7),
                plane_weight: weight.to_string(),
                radar_files: vec![scan_path.to_path_buf()],
            }
        })
        .collect()
}

/// Writes a synthetic scan under `dir/scans` and returns reports pointing at it.
pub fn prepare_synthetic_batch(
    config: &GeneratorConfig,
    dir: &Path,
) -> anyhow::Result<Vec<PirepRow>> {
    let scan = build_scan(config)?;
    let scan_path: PathBuf = dir.join("scans").join(config.scan_file_name());
    write_scan(&scan_path, &scan)?;
    Ok(build_reports(config, &scan_path))
}
