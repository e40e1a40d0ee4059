//! Picks the radar volumes a report is gridded against: the nearest sites,
//! then one scan time per site from a local `YYYY/MM/DD/SITE/` archive.

use crate::pirep::row::PirepRow;
use crate::sources::file_time::{radar_file_time, radar_site};
use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use pirepgrid::math::geo::haversine;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Sites considered for each report.
pub const NEAREST_SITES: usize = 5;

/// Reports this close to midnight also search the neighbouring day.
const DAY_EDGE_MINUTES: i64 = 30;

/// One row of the NEXRAD site table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NexradSite {
    #[serde(rename = "Site Code")]
    pub code: String,
    #[serde(rename = "Latitude")]
    pub lat: f64,
    #[serde(rename = "Longitude")]
    pub lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteTable {
    sites: Vec<NexradSite>,
}

impl SiteTable {
    pub fn new(sites: Vec<NexradSite>) -> Self {
        Self { sites }
    }

    /// Reads a JSON array of sites.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading site table {}", path_ref.display()))?;
        let sites: Vec<NexradSite> = serde_json::from_str(&contents)
            .with_context(|| format!("parsing site table {}", path_ref.display()))?;
        Ok(Self::new(sites))
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn site(&self, code: &str) -> Option<&NexradSite> {
        self.sites.iter().find(|site| site.code == code)
    }

    /// The `count` sites nearest to `(lat, lon)` by great-circle distance,
    /// nearest first. Equal distances fall back to site code order.
    pub fn closest(&self, lat: f64, lon: f64, count: usize) -> Vec<&NexradSite> {
        let mut ranked: Vec<(f64, &NexradSite)> = self
            .sites
            .iter()
            .map(|site| (haversine(lat, lon, site.lat, site.lon), site))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.code.cmp(&b.1.code)));
        ranked.into_iter().take(count).map(|(_, site)| site).collect()
    }
}

/// An archived volume and the scan time in its name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScanListing {
    pub time: NaiveDateTime,
    pub path: PathBuf,
}

/// Archive days to search for a report, in chronological order.
pub fn listing_days(report: NaiveDateTime) -> Vec<NaiveDate> {
    let edge = Duration::minutes(DAY_EDGE_MINUTES);
    let day = report.date();
    let mut days = Vec::with_capacity(3);
    let before = (report - edge).date();
    if before != day {
        days.push(before);
    }
    days.push(day);
    let after = (report + edge).date();
    if after != day {
        days.push(after);
    }
    days
}

/// Scan paired with a report from time-sorted `scans`.
///
/// Takes the first scan at or after the report; the last scan stands in when
/// the report falls at or beyond the final two.
pub fn nearest_scan(scans: &[ScanListing], report: NaiveDateTime) -> Option<&ScanListing> {
    let last = scans.len().checked_sub(1)?;
    let idx = scans.partition_point(|scan| scan.time < report);
    scans.get(idx.min(last))
}

fn is_volume(path: &Path, site: &str) -> bool {
    let metadata_only = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(true, |name| name.contains("_MDM"));
    !metadata_only && radar_site(path) == Some(site)
}

/// Level-II volumes stored as `root/YYYY/MM/DD/SITE/<file>`.
pub struct ScanArchive {
    root: PathBuf,
}

impl ScanArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn site_dir(&self, site: &str, day: NaiveDate) -> PathBuf {
        self.root.join(day.format("%Y/%m/%d").to_string()).join(site)
    }

    /// Time-sorted volumes for one site and day. A missing directory is empty.
    pub fn listings(&self, site: &str, day: NaiveDate) -> anyhow::Result<Vec<ScanListing>> {
        let dir = self.site_dir(site, day);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut listings = Vec::new();
        let entries =
            fs::read_dir(&dir).with_context(|| format!("listing scans in {}", dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("listing scans in {}", dir.display()))?
                .path();
            if !is_volume(&path, site) {
                continue;
            }
            if let Ok(time) = radar_file_time(&path) {
                listings.push(ScanListing { time, path });
            }
        }
        listings.sort();
        Ok(listings)
    }

    /// One volume per nearby site, nearest site first. Sites with no
    /// archived volume around the report are skipped.
    pub fn match_row(
        &self,
        row: &PirepRow,
        sites: &SiteTable,
        count: usize,
    ) -> anyhow::Result<Vec<PathBuf>> {
        let days = listing_days(row.datetime);
        let mut files = Vec::new();
        for site in sites.closest(row.lat, row.lon, count) {
            let mut scans = Vec::new();
            for &day in &days {
                scans.extend(self.listings(&site.code, day)?);
            }
            if let Some(scan) = nearest_scan(&scans, row.datetime) {
                files.push(scan.path.clone());
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn at(stamp: &str) -> NaiveDateTime {
        stamp.parse().unwrap()
    }

    fn site(code: &str, lat: f64, lon: f64) -> NexradSite {
        NexradSite {
            code: code.into(),
            lat,
            lon,
        }
    }

    fn plains() -> SiteTable {
        SiteTable::new(vec![
            site("KAMA", 35.233, -101.709),
            site("KFWS", 32.573, -97.303),
            site("KINX", 36.175, -95.564),
            site("KVNX", 36.741, -98.128),
            site("KFDR", 34.362, -98.977),
            site("KTLX", 35.333, -97.278),
        ])
    }

    fn listing(stamp: &str) -> ScanListing {
        ScanListing {
            time: at(stamp),
            path: PathBuf::from(stamp),
        }
    }

    fn row(datetime: &str) -> PirepRow {
        PirepRow {
            id: 9,
            datetime: at(datetime),
            lat: 35.22,
            lon: -97.44,
            flight_level_ft: 9_000.0,
            turbulence_intensity: 2,
            plane_weight: "M".into(),
            radar_files: vec![],
        }
    }

    fn touch(path: PathBuf) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn sites_are_ranked_by_distance() {
        let table = plains();
        let codes: Vec<&str> = table
            .closest(35.22, -97.44, NEAREST_SITES)
            .iter()
            .map(|site| site.code.as_str())
            .collect();
        assert_eq!(codes, vec!["KTLX", "KFDR", "KVNX", "KINX", "KFWS"]);
        assert_eq!(table.closest(35.22, -97.44, 1)[0].code, "KTLX");
        assert_eq!(table.closest(35.22, -97.44, 10).len(), table.len());
    }

    #[test]
    fn scan_at_or_after_the_report_is_chosen() {
        let scans = [
            listing("2013-05-20T20:00:00"),
            listing("2013-05-20T20:05:00"),
            listing("2013-05-20T20:10:00"),
        ];
        let pick = |stamp: &str| nearest_scan(&scans, at(stamp)).unwrap().time;
        assert_eq!(pick("2013-05-20T20:03:00"), at("2013-05-20T20:05:00"));
        assert_eq!(pick("2013-05-20T20:05:00"), at("2013-05-20T20:05:00"));
        assert_eq!(pick("2013-05-20T19:00:00"), at("2013-05-20T20:00:00"));
        assert_eq!(pick("2013-05-20T20:07:00"), at("2013-05-20T20:10:00"));
        assert_eq!(pick("2013-05-20T23:00:00"), at("2013-05-20T20:10:00"));
        assert!(nearest_scan(&[], at("2013-05-20T20:00:00")).is_none());
    }

    #[test]
    fn reports_near_midnight_search_both_days() {
        let day = |s: &str| s.parse::<NaiveDate>().unwrap();
        assert_eq!(
            listing_days(at("2014-07-03T00:10:00")),
            vec![day("2014-07-02"), day("2014-07-03")]
        );
        assert_eq!(listing_days(at("2014-07-03T12:00:00")), vec![day("2014-07-03")]);
        assert_eq!(
            listing_days(at("2014-07-03T23:45:00")),
            vec![day("2014-07-03"), day("2014-07-04")]
        );
    }

    #[test]
    fn archive_match_takes_one_volume_per_site() {
        let dir = tempdir().unwrap();
        let archive = ScanArchive::new(dir.path());
        let day = at("2013-05-20T00:00:00").date();
        let tlx = archive.site_dir("KTLX", day);
        touch(tlx.join("KTLX20130520_201643_V06.json"));
        touch(tlx.join("KTLX20130520_202112_V06.json"));
        touch(tlx.join("KTLX20130520_201900_V06_MDM"));
        touch(archive.site_dir("KFDR", day).join("KFDR20130520_201900_V06.json"));

        let files = archive.match_row(&row("2013-05-20T20:18:00"), &plains(), 3).unwrap();
        assert_eq!(
            files,
            vec![
                tlx.join("KTLX20130520_202112_V06.json"),
                archive
                    .site_dir("KFDR", day)
                    .join("KFDR20130520_201900_V06.json"),
            ]
        );
        assert_eq!(archive.listings("KTLX", day).unwrap().len(), 2);
    }

    #[test]
    fn archive_match_crosses_midnight() {
        let dir = tempdir().unwrap();
        let archive = ScanArchive::new(dir.path());
        let late = archive.site_dir("KTLX", at("2013-05-20T00:00:00").date());
        let early = archive.site_dir("KTLX", at("2013-05-21T00:00:00").date());
        touch(late.join("KTLX20130520_235800_V06.json"));
        touch(early.join("KTLX20130521_002000_V06.json"));

        let files = archive.match_row(&row("2013-05-21T00:10:00"), &plains(), 1).unwrap();
        assert_eq!(files, vec![early.join("KTLX20130521_002000_V06.json")]);
    }

    #[test]
    fn site_table_loads_named_columns() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(br#"[{"Site Code": "KTLX", "Latitude": 35.333, "Longitude": -97.278}]"#)
            .unwrap();
        let table = SiteTable::load(temp.path()).unwrap();
        assert_eq!(table.site("KTLX").unwrap().lon, -97.278);
        assert!(table.site("KINX").is_none());
    }
}
