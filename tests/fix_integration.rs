//! Integration tests for file sessions
//!
//! Tests check and fix sessions against real files: bottom-up application,
//! file removal, atomic write-back and dry runs.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use yore::{
    check_file, fix_file, source_files, CheckStatus, Context, DirectiveParser, FileOutcome,
    ScanOptions, StaticLifecycle, TriggerInputs,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn lifecycle() -> StaticLifecycle {
    StaticLifecycle::new()
        .with("3.8", date(2019, 10, 14), date(2024, 10, 7))
        .with("3.9", date(2020, 10, 5), date(2025, 11, 1))
        .with("3.14", date(2025, 10, 7), date(2030, 11, 1))
}

/// Helper to create a project with a few annotated modules
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let pkg = dir.path().join("pkg");
    fs::create_dir_all(&pkg).unwrap();

    fs::write(
        pkg.join("compat.py"),
        r#"import sys

# YORE: EOL 3.8: Replace block with line 4.
if sys.version_info < (3, 9):
    from astunparse import unparse
else:
    from ast import unparse


def strip(a):
    # YORE: EOL 3.8: Replace `lstrip` with `removeprefix` within line.
    return a.lstrip("_")


def load(
    # YORE: Bump 1.0.0: Replace ` | None,` with `,` within line.
    path: str | None,
): ...
"#,
    )
    .unwrap();

    fs::write(
        pkg.join("legacy.py"),
        "# YORE: Bump 1.0: Remove file.\nimport warnings\nwarnings.warn('deprecated')\n",
    )
    .unwrap();

    fs::write(
        pkg.join("future.py"),
        "# YORE: EOL 3.14: Remove line.\nimport typing_extensions\n",
    )
    .unwrap();

    dir
}

fn run_fix(root: &Path, inputs: &TriggerInputs, dry_run: bool) -> Vec<yore::FileFix> {
    let parser = DirectiveParser::default();
    let lifecycle = lifecycle();
    let ctx = Context {
        parser: &parser,
        inputs,
        lifecycle: &lifecycle,
    };
    source_files(root, &ScanOptions::default())
        .iter()
        .map(|file| fix_file(file, ctx, dry_run).unwrap())
        .collect()
}

#[test]
fn test_fix_eol_directives() {
    let project = setup_project();
    let inputs = TriggerInputs::new(date(2025, 1, 1));

    let fixes = run_fix(project.path(), &inputs, false);
    let compat = fixes
        .iter()
        .find(|fix| fix.path.ends_with("compat.py"))
        .unwrap();
    assert_eq!(compat.outcome, FileOutcome::Rewritten);
    assert_eq!(compat.applied, 2);
    assert!(compat.errors.is_empty());

    let content = fs::read_to_string(project.path().join("pkg/compat.py")).unwrap();
    assert_eq!(
        content,
        r#"import sys

from ast import unparse


def strip(a):
    return a.removeprefix("_")


def load(
    # YORE: Bump 1.0.0: Replace ` | None,` with `,` within line.
    path: str | None,
): ...
"#
    );

    // Not due yet, and no bump was given.
    assert!(project.path().join("pkg/legacy.py").exists());
    let future = fs::read_to_string(project.path().join("pkg/future.py")).unwrap();
    assert!(future.contains("typing_extensions"));
}

#[test]
fn test_fix_bump_removes_file() {
    let project = setup_project();
    let inputs = TriggerInputs::new(date(2019, 1, 1)).with_next_version("1.0.0");

    let fixes = run_fix(project.path(), &inputs, false);
    let legacy = fixes
        .iter()
        .find(|fix| fix.path.ends_with("legacy.py"))
        .unwrap();
    assert_eq!(legacy.outcome, FileOutcome::Removed);
    assert!(!project.path().join("pkg/legacy.py").exists());

    let content = fs::read_to_string(project.path().join("pkg/compat.py")).unwrap();
    assert!(content.contains("    path: str,\n"));
    assert!(!content.contains("Bump 1.0.0"));
    assert!(content.contains("EOL 3.8"));
}

#[test]
fn test_fix_is_idempotent() {
    let project = setup_project();
    let inputs = TriggerInputs::new(date(2025, 1, 1));

    run_fix(project.path(), &inputs, false);
    let first = fs::read_to_string(project.path().join("pkg/compat.py")).unwrap();

    let fixes = run_fix(project.path(), &inputs, false);
    assert!(fixes
        .iter()
        .all(|fix| fix.outcome == FileOutcome::Unchanged));
    let second = fs::read_to_string(project.path().join("pkg/compat.py")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_dry_run_leaves_files_alone() {
    let project = setup_project();
    let before = fs::read_to_string(project.path().join("pkg/compat.py")).unwrap();
    let inputs = TriggerInputs::new(date(2031, 1, 1)).with_next_version("2");

    let fixes = run_fix(project.path(), &inputs, true);
    assert!(fixes.iter().any(|fix| fix.outcome == FileOutcome::Removed));
    assert!(fixes
        .iter()
        .any(|fix| fix.outcome == FileOutcome::Rewritten && fix.fixed != fix.original));

    assert_eq!(
        fs::read_to_string(project.path().join("pkg/compat.py")).unwrap(),
        before
    );
    assert!(project.path().join("pkg/legacy.py").exists());
}

#[test]
fn test_fix_with_lead_time() {
    let project = setup_project();
    let inputs =
        TriggerInputs::new(date(2030, 6, 1)).with_eol_lead(chrono::TimeDelta::days(180));

    run_fix(project.path(), &inputs, false);
    let future = fs::read_to_string(project.path().join("pkg/future.py")).unwrap();
    assert_eq!(future, "");
}

#[test]
fn test_unknown_version_is_reported_per_directive() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mod.py");
    fs::write(
        &file,
        "# YORE: EOL 2.7: Remove line.\nimport six\n# YORE: EOL 3.8: Remove line.\nimport mock\n",
    )
    .unwrap();

    let fixes = run_fix(dir.path(), &TriggerInputs::new(date(2025, 1, 1)), false);
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].applied, 1);
    assert_eq!(fixes[0].errors.len(), 1);
    assert_eq!(fixes[0].errors[0].0.origin_line, 1);
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "# YORE: EOL 2.7: Remove line.\nimport six\n"
    );
}

#[test]
fn test_remove_file_single_comment() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("file1.py");
    fs::write(&file, "# YORE: Bump 1: Remove file.").unwrap();

    let parser = DirectiveParser::default();
    let lifecycle = StaticLifecycle::new();
    let inputs = TriggerInputs::new(date(2025, 1, 1)).with_next_version("1");
    let ctx = Context {
        parser: &parser,
        inputs: &inputs,
        lifecycle: &lifecycle,
    };

    let fix = fix_file(&file, ctx, false).unwrap();
    assert_eq!(fix.outcome, FileOutcome::Removed);
    assert!(!file.exists());
}

#[test]
fn test_check_file_statuses() {
    let project = setup_project();
    let parser = DirectiveParser::default();
    let lifecycle = lifecycle();
    let inputs = TriggerInputs::new(date(2025, 1, 1))
        .with_next_version("0.9")
        .with_eol_lead(chrono::TimeDelta::days(365));
    let ctx = Context {
        parser: &parser,
        inputs: &inputs,
        lifecycle: &lifecycle,
    };

    let findings = check_file(&project.path().join("pkg/compat.py"), ctx);
    let statuses: Vec<_> = findings
        .iter()
        .map(|f| (f.directive.origin_line, *f.status.as_ref().unwrap()))
        .collect();
    assert_eq!(
        statuses,
        [
            (3, CheckStatus::Due { date: Some(date(2024, 10, 7)) }),
            (11, CheckStatus::Due { date: Some(date(2024, 10, 7)) }),
            (16, CheckStatus::NotDue),
        ]
    );

    let findings = check_file(&project.path().join("pkg/future.py"), ctx);
    assert!(matches!(
        findings[0].status,
        Ok(CheckStatus::NotDue)
    ));

    assert!(check_file(&project.path().join("pkg/missing.py"), ctx).is_empty());
}
