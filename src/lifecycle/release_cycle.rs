//! Release-cycle documents: a JSON object keyed by version, each entry
//! carrying `first_release` and `end_of_life` dates.

use super::{LifecycleDates, LifecycleError};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Python's release-cycle data, maintained in the devguide.
pub const DEFAULT_URL: &str =
    "https://raw.githubusercontent.com/python/devguide/main/include/release-cycle.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ReleaseCycleEntry {
    first_release: String,
    end_of_life: String,
}

/// Where a release-cycle document is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseCycleSource {
    Remote(String),
    File(PathBuf),
}

impl Default for ReleaseCycleSource {
    fn default() -> Self {
        ReleaseCycleSource::Remote(DEFAULT_URL.to_string())
    }
}

impl ReleaseCycleSource {
    /// Read and parse the whole document.
    pub fn load(&self) -> Result<HashMap<String, LifecycleDates>, LifecycleError> {
        let body = match self {
            ReleaseCycleSource::Remote(url) => fetch(url)?,
            ReleaseCycleSource::File(path) => {
                fs::read_to_string(path).map_err(|source| LifecycleError::Io {
                    path: path.clone(),
                    source,
                })?
            }
        };
        parse_release_cycle(&body)
    }
}

fn fetch(url: &str) -> Result<String, LifecycleError> {
    let fetch_error = |e: reqwest::Error| LifecycleError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(fetch_error)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(fetch_error)
}

/// Parse a release-cycle JSON document into lifecycle dates per version.
pub fn parse_release_cycle(json: &str) -> Result<HashMap<String, LifecycleDates>, LifecycleError> {
    let entries: HashMap<String, ReleaseCycleEntry> = serde_json::from_str(json)?;

    entries
        .into_iter()
        .map(|(version, entry)| {
            let first_release = parse_cycle_date(&entry.first_release).ok_or_else(|| {
                LifecycleError::InvalidDate {
                    version: version.clone(),
                    field: "first_release",
                    value: entry.first_release.clone(),
                }
            })?;
            let end_of_life = parse_cycle_date(&entry.end_of_life).ok_or_else(|| {
                LifecycleError::InvalidDate {
                    version: version.clone(),
                    field: "end_of_life",
                    value: entry.end_of_life.clone(),
                }
            })?;
            Ok((
                version,
                LifecycleDates {
                    first_release,
                    end_of_life,
                },
            ))
        })
        .collect()
}

/// Parse `YYYY-MM-DD`, or `YYYY-MM` meaning the first day of the next month.
pub fn parse_cycle_date(value: &str) -> Option<NaiveDate> {
    let parts = value
        .trim()
        .split('-')
        .map(|part| part.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [year, month] => {
            let year = i32::try_from(*year).ok()?;
            if !(1..=12).contains(month) {
                return None;
            }
            if *month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(year, month + 1, 1)
            }
        }
        [year, month, day] => NaiveDate::from_ymd_opt(i32::try_from(*year).ok()?, *month, *day),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_cycle_date() {
        assert_eq!(parse_cycle_date("2024-10-07"), Some(date(2024, 10, 7)));
        assert_eq!(parse_cycle_date("2025-10"), Some(date(2025, 11, 1)));
        assert_eq!(parse_cycle_date("2026-12"), Some(date(2027, 1, 1)));
        assert_eq!(parse_cycle_date("2026-13"), None);
        assert_eq!(parse_cycle_date("2026-02-30"), None);
        assert_eq!(parse_cycle_date("2026"), None);
        assert_eq!(parse_cycle_date("soon"), None);
    }

    #[test]
    fn test_parse_release_cycle() {
        let dates = parse_release_cycle(
            r#"{"3.13": {"branch": "3.13", "pep": 719, "status": "bugfix",
                         "first_release": "2024-10-07", "end_of_life": "2029-10",
                         "release_manager": "Thomas Wouters"}}"#,
        )
        .unwrap();
        assert_eq!(
            dates["3.13"],
            LifecycleDates {
                first_release: date(2024, 10, 7),
                end_of_life: date(2029, 11, 1),
            }
        );
    }

    #[test]
    fn test_parse_release_cycle_invalid_date() {
        let result = parse_release_cycle(
            r#"{"3.13": {"first_release": "someday", "end_of_life": "2029-10"}}"#,
        );
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidDate { field: "first_release", .. })
        ));
    }

    #[test]
    fn test_parse_release_cycle_invalid_json() {
        assert!(matches!(
            parse_release_cycle("[1, 2]"),
            Err(LifecycleError::Json(_))
        ));
    }

    #[test]
    fn test_default_source_is_remote() {
        assert_eq!(
            ReleaseCycleSource::default(),
            ReleaseCycleSource::Remote(DEFAULT_URL.to_string())
        );
    }
}
