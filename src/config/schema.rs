use crate::directive::DEFAULT_PREFIX;
use crate::scan::{DEFAULT_EXCLUDE, DEFAULT_EXTENSIONS};
use globset::Glob;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Contents of a `yore.toml` file. Every field is optional.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct YoreConfig {
    /// Word that introduces a directive comment (`# YORE: ...`).
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Directory-name globs skipped while scanning.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// File extensions scanned inside directories.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Where to fetch release-cycle data from.
    #[serde(default)]
    pub lifecycle_url: Option<String>,
    /// Local release-cycle document, used instead of fetching.
    #[serde(default)]
    pub lifecycle_file: Option<PathBuf>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect()
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for YoreConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            exclude: default_exclude(),
            extensions: default_extensions(),
            lifecycle_url: None,
            lifecycle_file: None,
        }
    }
}

impl YoreConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.prefix.trim().is_empty() {
            issues.push(ValidationIssue::Empty { field: "prefix" });
        } else if self.prefix.contains(':') {
            issues.push(ValidationIssue::Invalid {
                field: "prefix",
                message: "prefix cannot contain ':'".to_string(),
            });
        }

        if self.extensions.is_empty() {
            issues.push(ValidationIssue::Empty {
                field: "extensions",
            });
        }

        for pattern in &self.exclude {
            if let Err(e) = Glob::new(pattern) {
                issues.push(ValidationIssue::Invalid {
                    field: "exclude",
                    message: format!("'{pattern}': {e}"),
                });
            }
        }

        if self.lifecycle_url.is_some() && self.lifecycle_file.is_some() {
            issues.push(ValidationIssue::Invalid {
                field: "lifecycle_file",
                message: "lifecycle_url and lifecycle_file cannot both be set".to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    Empty {
        field: &'static str,
    },
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Empty { field } => write!(f, "'{field}' cannot be empty"),
            ValidationIssue::Invalid { field, message } => {
                write!(f, "invalid '{field}': {message}")
            }
        }
    }
}
