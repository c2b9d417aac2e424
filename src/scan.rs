//! File discovery and directive collection.

use crate::directive::{Directive, DirectiveParser, ParseError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Directory names skipped by default.
pub const DEFAULT_EXCLUDE: &[&str] = &[".*", "__py*", "build", "dist"];

/// File extensions scanned by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["py"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },
}

/// Which files a directory walk yields.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    exclude: GlobSet,
    extensions: Vec<String>,
}

impl ScanOptions {
    /// Build options from exclude globs (matched against directory names)
    /// and file extensions (without the leading dot).
    pub fn new<P, E>(exclude: P, extensions: E) -> Result<Self, ScanError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in exclude {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern).map_err(|source| ScanError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|source| ScanError::InvalidPattern {
            pattern: "<set>".to_string(),
            source,
        })?;

        Ok(Self {
            exclude,
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
                .collect(),
        })
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude.is_match(name)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        // The default patterns are plain literals and simple wildcards.
        Self::new(DEFAULT_EXCLUDE, DEFAULT_EXTENSIONS).expect("default exclude patterns compile")
    }
}

/// Files under `path` to scan, sorted.
///
/// A file path yields itself, whatever its extension. A directory is walked
/// recursively, pruning directories whose name matches an exclude pattern.
/// Unreadable entries are skipped.
pub fn source_files(path: &Path, options: &ScanOptions) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !options.is_excluded(&entry.file_name().to_string_lossy())
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && options.has_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Every directive in `lines`, numbered from 1, in buffer order.
pub fn collect_directives(lines: &[String], parser: &DirectiveParser) -> Vec<Directive> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| parser.parse(line, index + 1))
        .collect()
}

/// Comments that carry the prefix but do not follow the grammar.
pub fn malformed_directives(lines: &[String], parser: &DirectiveParser) -> Vec<ParseError> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| parser.parse_strict(line, index + 1).err())
        .collect()
}

/// Read a file into a line buffer, or `None` if it cannot be read.
pub fn read_lines(path: &Path) -> Option<Vec<String>> {
    fs::read_to_string(path)
        .ok()
        .map(|text| crate::buffer::split_lines(&text))
}
