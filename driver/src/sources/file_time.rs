use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::Path;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FileTimeError {
    #[error("radar file '{0}' has no SITEYYYYMMDD_HHMMSS stamp")]
    Malformed(String),
}

fn stem(path: &Path) -> Result<&str, FileTimeError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| FileTimeError::Malformed(path.display().to_string()))
}

/// Scan time encoded in a NEXRAD level-II file name.
///
/// Accepts `KAKQ20241205_001256_V06` with any directory prefix or extension.
pub fn radar_file_time(path: &Path) -> Result<NaiveDateTime, FileTimeError> {
    let name = stem(path)?;
    let malformed = || FileTimeError::Malformed(name.to_string());

    let mut parts = name.split('_');
    let site_and_date = parts.next().ok_or_else(malformed)?;
    let clock = parts.next().ok_or_else(malformed)?;
    if site_and_date.len() < 8 || clock.len() < 6 {
        return Err(malformed());
    }

    let date_digits = site_and_date
        .get(site_and_date.len() - 8..)
        .ok_or_else(malformed)?;
    let clock_digits = clock.get(..6).ok_or_else(malformed)?;
    let date = NaiveDate::parse_from_str(date_digits, "%Y%m%d").map_err(|_| malformed())?;
    let time = NaiveTime::parse_from_str(clock_digits, "%H%M%S").map_err(|_| malformed())?;
    Ok(NaiveDateTime::new(date, time))
}

/// Four-letter radar site code at the start of a file name.
pub fn radar_site(path: &Path) -> Option<&str> {
    let name = stem(path).ok()?;
    let site = name.get(..4)?;
    site.chars()
        .all(|c| c.is_ascii_alphabetic())
        .then_some(site)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_archive_key() {
        let path = Path::new("2024/12/05/KAKQ/KAKQ20241205_001256_V06");
        let time = radar_file_time(path).unwrap();
        assert_eq!(time.to_string(), "2024-12-05 00:12:56");
        assert_eq!(radar_site(path), Some("KAKQ"));
    }

    #[test]
    fn ignores_extensions() {
        let time = radar_file_time(Path::new("/data/KTLX20130520_201643_V06.json")).unwrap();
        assert_eq!(time.to_string(), "2013-05-20 20:16:43");
    }

    #[test]
    fn rejects_names_without_stamp() {
        assert!(radar_file_time(Path::new("KAKQ_NEXRAD")).is_err());
        assert!(radar_file_time(Path::new("scan.json")).is_err());
        assert!(radar_file_time(Path::new("KAKQ20241305_001256_V06")).is_err());
        assert_eq!(radar_site(Path::new("12345")), None);
    }
}
