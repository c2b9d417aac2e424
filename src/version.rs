//! Version comparison for `bump` directives.
//!
//! Directive versions are often short (`1`, `3.8`), so parsing pads the
//! numeric core to three components before handing it to `semver`.

use semver::Version;
use std::fmt;

/// Errors during version parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Invalid version string (e.g., "not-a-version")
    InvalidVersion { value: String, source: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidVersion { value, source } => {
                write!(f, "invalid version '{}': {}", value, source)
            }
        }
    }
}

impl std::error::Error for VersionError {}

/// Parse a version, padding missing minor/patch components with zeros.
///
/// # Examples
///
/// ```
/// use yore::version::parse_version;
///
/// assert_eq!(parse_version("1").unwrap().to_string(), "1.0.0");
/// assert_eq!(parse_version("3.8").unwrap().to_string(), "3.8.0");
/// assert_eq!(parse_version("v2.1.3-rc.1").unwrap().to_string(), "2.1.3-rc.1");
/// ```
pub fn parse_version(value: &str) -> Result<Version, VersionError> {
    let trimmed = value.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let split = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split);

    let components = core.split('.').count();
    let mut padded = core.to_string();
    for _ in components..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);

    Version::parse(&padded).map_err(|e| VersionError::InvalidVersion {
        value: value.to_string(),
        source: e.to_string(),
    })
}

/// Check whether `next` has reached `target`, i.e. `next >= target`.
///
/// # Examples
///
/// ```
/// use yore::version::has_reached;
///
/// assert!(has_reached("1.0.0", "1").unwrap());
/// assert!(has_reached("1.2", "1.1.9").unwrap());
/// assert!(!has_reached("0.9", "1").unwrap());
/// ```
pub fn has_reached(next: &str, target: &str) -> Result<bool, VersionError> {
    Ok(parse_version(next)? >= parse_version(target)?)
}
