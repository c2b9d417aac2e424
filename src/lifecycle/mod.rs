//! Version lifecycle lookup: first-release and end-of-life dates.
//!
//! Evaluation of `eol`/`bol` directives goes through the [`Lifecycle`]
//! trait, so callers decide where the dates come from. [`LifecycleTable`]
//! loads a release-cycle document once and answers every later lookup from
//! memory; [`StaticLifecycle`] is a plain in-memory table.

pub mod release_cycle;

pub use release_cycle::{parse_cycle_date, parse_release_cycle, ReleaseCycleSource, DEFAULT_URL};

use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Dates bounding the supported life of one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleDates {
    pub first_release: NaiveDate,
    pub end_of_life: NaiveDate,
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("no lifecycle data for version {0}")]
    UnknownVersion(String),

    #[error("failed to fetch lifecycle data from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to read lifecycle data from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An earlier load failed; the table does not retry.
    #[error("lifecycle data unavailable: {0}")]
    Unavailable(String),

    #[error("failed to parse lifecycle data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {field} date '{value}' for version {version}")]
    InvalidDate {
        version: String,
        field: &'static str,
        value: String,
    },
}

/// Source of lifecycle dates, keyed by exact version string.
pub trait Lifecycle {
    fn dates(&self, version: &str) -> Result<LifecycleDates, LifecycleError>;
}

/// Lifecycle dates loaded on first use and cached for the table's lifetime.
///
/// A failed load is remembered too: the first lookup reports the underlying
/// error and every later lookup reports [`LifecycleError::Unavailable`]
/// without touching the source again.
#[derive(Debug)]
pub struct LifecycleTable {
    source: ReleaseCycleSource,
    dates: OnceLock<Result<HashMap<String, LifecycleDates>, String>>,
}

impl LifecycleTable {
    pub fn new(source: ReleaseCycleSource) -> Self {
        Self {
            source,
            dates: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &ReleaseCycleSource {
        &self.source
    }

    /// Whether the data has been loaded successfully.
    pub fn is_loaded(&self) -> bool {
        matches!(self.dates.get(), Some(Ok(_)))
    }

    fn table(&self) -> Result<&HashMap<String, LifecycleDates>, LifecycleError> {
        let mut first_error = None;
        let loaded = self.dates.get_or_init(|| {
            self.source.load().map_err(|e| {
                let reason = e.to_string();
                first_error = Some(e);
                reason
            })
        });
        if let Some(e) = first_error {
            return Err(e);
        }
        loaded
            .as_ref()
            .map_err(|reason| LifecycleError::Unavailable(reason.clone()))
    }
}

impl Default for LifecycleTable {
    fn default() -> Self {
        Self::new(ReleaseCycleSource::default())
    }
}

impl Lifecycle for LifecycleTable {
    fn dates(&self, version: &str) -> Result<LifecycleDates, LifecycleError> {
        self.table()?
            .get(version)
            .copied()
            .ok_or_else(|| LifecycleError::UnknownVersion(version.to_string()))
    }
}

/// In-memory lifecycle table.
#[derive(Debug, Clone, Default)]
pub struct StaticLifecycle {
    dates: HashMap<String, LifecycleDates>,
}

impl StaticLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a release-cycle JSON document.
    pub fn from_json(json: &str) -> Result<Self, LifecycleError> {
        Ok(Self {
            dates: parse_release_cycle(json)?,
        })
    }

    pub fn with(
        mut self,
        version: impl Into<String>,
        first_release: NaiveDate,
        end_of_life: NaiveDate,
    ) -> Self {
        self.dates.insert(
            version.into(),
            LifecycleDates {
                first_release,
                end_of_life,
            },
        );
        self
    }
}

impl Lifecycle for StaticLifecycle {
    fn dates(&self, version: &str) -> Result<LifecycleDates, LifecycleError> {
        self.dates
            .get(version)
            .copied()
            .ok_or_else(|| LifecycleError::UnknownVersion(version.to_string()))
    }
}
