//! Per-file check and fix sessions.
//!
//! A session reads one file into a line buffer, collects its directives and
//! either reports their status or applies them bottom-to-top, then writes
//! the buffer back (or deletes the file) in one step.

use crate::buffer::join_lines;
use crate::directive::{Directive, DirectiveParser};
use crate::editor::{self, CheckStatus, EditError, FixOutcome, TriggerInputs};
use crate::lifecycle::Lifecycle;
use crate::scan::{collect_directives, read_lines};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything a session needs besides the file itself.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub parser: &'a DirectiveParser,
    pub inputs: &'a TriggerInputs,
    pub lifecycle: &'a dyn Lifecycle,
}

/// Check-mode result for one directive.
#[derive(Debug)]
pub struct Finding {
    pub path: PathBuf,
    pub directive: Directive,
    pub status: Result<CheckStatus, EditError>,
}

/// Check every directive in a file. Unreadable files have no directives.
pub fn check_file(path: &Path, ctx: Context<'_>) -> Vec<Finding> {
    let Some(lines) = read_lines(path) else {
        return Vec::new();
    };

    collect_directives(&lines, ctx.parser)
        .into_iter()
        .map(|directive| {
            let status = editor::check(&directive, ctx.inputs, ctx.lifecycle);
            Finding {
                path: path.to_path_buf(),
                directive,
                status,
            }
        })
        .collect()
}

/// Result of fixing one buffer.
#[derive(Debug, Default)]
pub struct BufferFix {
    /// Number of directives applied.
    pub applied: usize,
    /// A `remove file` directive fired.
    pub remove_file: bool,
    /// Directives that could not be evaluated or applied.
    pub errors: Vec<(Directive, EditError)>,
}

/// Apply `directives` to `lines` from the highest origin line to the lowest.
///
/// A directive that fails is recorded and skipped; the buffer is left as the
/// previous directives made it.
pub fn fix_buffer(
    lines: &mut Vec<String>,
    mut directives: Vec<Directive>,
    ctx: Context<'_>,
) -> BufferFix {
    directives.sort_by(|a, b| b.origin_line.cmp(&a.origin_line));

    let mut result = BufferFix::default();
    for directive in directives {
        match editor::apply(&directive, lines, ctx.inputs, ctx.lifecycle) {
            Ok(FixOutcome::NotDue) => {}
            Ok(FixOutcome::Applied) => result.applied += 1,
            Ok(FixOutcome::RemoveFile) => {
                result.applied += 1;
                result.remove_file = true;
                break;
            }
            Err(e) => result.errors.push((directive, e)),
        }
    }
    result
}

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Unchanged,
    Rewritten,
    Removed,
}

/// Result of fixing one file.
#[derive(Debug)]
pub struct FileFix {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    pub applied: usize,
    /// File contents before the fix.
    pub original: String,
    /// File contents after the fix (empty when removed).
    pub fixed: String,
    pub errors: Vec<(Directive, EditError)>,
}

/// Fix a file in place.
///
/// The file is deleted when a `remove file` directive fires, rewritten
/// atomically when any other directive fires, and left alone otherwise.
/// With `dry_run` the outcome is computed but the disk is not touched.
pub fn fix_file(path: &Path, ctx: Context<'_>, dry_run: bool) -> Result<FileFix, SessionError> {
    let mut lines = read_lines(path).unwrap_or_default();
    let original = join_lines(&lines);
    let directives = collect_directives(&lines, ctx.parser);
    let result = fix_buffer(&mut lines, directives, ctx);

    let outcome = if result.remove_file {
        if !dry_run {
            fs::remove_file(path).map_err(|source| SessionError::Remove {
                path: path.to_path_buf(),
                source,
            })?;
        }
        FileOutcome::Removed
    } else if result.applied > 0 {
        if !dry_run {
            atomic_write(path, join_lines(&lines).as_bytes()).map_err(|source| {
                SessionError::Write {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        }
        FileOutcome::Rewritten
    } else {
        FileOutcome::Unchanged
    };

    let fixed = if outcome == FileOutcome::Removed {
        String::new()
    } else {
        join_lines(&lines)
    };

    Ok(FileFix {
        path: path.to_path_buf(),
        outcome,
        applied: result.applied,
        original,
        fixed,
        errors: result.errors,
    })
}

/// Atomic file write: tempfile + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Same directory, so the rename stays on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Keep the original permissions
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::split_lines;
    use crate::lifecycle::StaticLifecycle;
    use chrono::NaiveDate;

    fn inputs() -> TriggerInputs {
        TriggerInputs::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).with_next_version("1.0")
    }

    #[test]
    fn test_fix_buffer_applies_bottom_up() {
        let parser = DirectiveParser::default();
        let lifecycle = StaticLifecycle::new();
        let inputs = inputs();
        let ctx = Context {
            parser: &parser,
            inputs: &inputs,
            lifecycle: &lifecycle,
        };

        let mut lines = split_lines(
            "a\n# YORE: Bump 1: Remove line.\nb\nc\n# YORE: Bump 1: Replace line with `D`.\nd\n",
        );
        // Collected in buffer order; fix_buffer reorders them.
        let directives = collect_directives(&lines, &parser);
        let result = fix_buffer(&mut lines, directives, ctx);

        assert_eq!(result.applied, 2);
        assert!(result.errors.is_empty());
        assert_eq!(join_lines(&lines), "a\nc\nD\n");
    }

    #[test]
    fn test_fix_buffer_records_errors_and_continues() {
        let parser = DirectiveParser::default();
        let lifecycle = StaticLifecycle::new();
        let inputs = inputs();
        let ctx = Context {
            parser: &parser,
            inputs: &inputs,
            lifecycle: &lifecycle,
        };

        let mut lines = split_lines(
            "# YORE: Bump 1: Remove line.\nx\n# YORE: EOL 3.8: Remove line.\ny\n",
        );
        let directives = collect_directives(&lines, &parser);
        let result = fix_buffer(&mut lines, directives, ctx);

        assert_eq!(result.applied, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].0.origin_line, 3);
        assert_eq!(join_lines(&lines), "# YORE: EOL 3.8: Remove line.\ny\n");
    }

    #[test]
    fn test_atomic_write_keeps_contents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("module.py");
        fs::write(&path, "old\n").unwrap();

        atomic_write(&path, b"new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }
}
