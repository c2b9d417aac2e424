//! Lead times (`2 weeks`, `1m`) and human-readable day counts.

use chrono::TimeDelta;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid duration '{0}': expected a number followed by days, weeks, months or years")]
    Invalid(String),

    #[error("duration '{0}' is out of range")]
    OutOfRange(String),
}

fn lead_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*([a-z])[a-z]*\s*$").expect("lead time pattern compiles")
    })
}

/// Parse a lead time such as `2 weeks`, `1 month` or `10d`.
///
/// Units may be shortened to their first letter. A month counts as 31 days
/// and a year as 365.
pub fn parse_lead_time(value: &str) -> Result<TimeDelta, DurationError> {
    let invalid = || DurationError::Invalid(value.to_string());
    let lowered = value.to_ascii_lowercase();
    let caps = lead_time_pattern().captures(&lowered).ok_or_else(invalid)?;

    let multiplier = match &caps[2] {
        "d" => 1,
        "w" => 7,
        "m" => 31,
        "y" => 365,
        _ => return Err(invalid()),
    };
    let number: i64 = caps[1]
        .parse()
        .map_err(|_| DurationError::OutOfRange(value.to_string()))?;

    number
        .checked_mul(multiplier)
        .and_then(TimeDelta::try_days)
        .ok_or_else(|| DurationError::OutOfRange(value.to_string()))
}

/// Render a number of days the way a person would say it.
pub fn natural_delta(days: i64) -> String {
    let days = days.abs();
    match days {
        0 => "less than a day".to_string(),
        1 => "a day".to_string(),
        2..=29 => format!("{days} days"),
        30..=44 => "a month".to_string(),
        45..=364 => format!("{} months", ((days as f64) / 30.4).round() as i64),
        365..=547 => "a year".to_string(),
        _ => format!("{} years", ((days as f64) / 365.0).round() as i64),
    }
}
