//! Trigger evaluation and buffer mutation for a single directive.
//!
//! # Ordering
//!
//! [`apply`] works on the buffer's *current* indices and shifts every line
//! after the directive. When a buffer holds several directives, callers must
//! apply them from the highest `origin_line` to the lowest, otherwise edits
//! land on the wrong lines. [`crate::session::fix_buffer`] does this.

use crate::buffer::{indent, line_terminator, reindent, scope_range};
use crate::directive::{Action, Directive, Kind, ReplaceTarget};
use crate::lifecycle::{Lifecycle, LifecycleError};
use crate::version::{has_reached, VersionError};
use chrono::{NaiveDate, TimeDelta, Utc};
use regex::Regex;
use std::ops::Range;
use thiserror::Error;

/// Caller-supplied values that decide whether a directive is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerInputs {
    /// Reference date for `eol`/`bol` directives.
    pub today: NaiveDate,
    /// The project's next version, for `bump` directives.
    pub next_version: Option<String>,
    /// How long before an end of life the directive counts as due.
    pub eol_lead: Option<TimeDelta>,
    /// How long before a first release the directive counts as due.
    pub bol_lead: Option<TimeDelta>,
}

impl TriggerInputs {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            next_version: None,
            eol_lead: None,
            bol_lead: None,
        }
    }

    /// Inputs dated today (UTC).
    pub fn today() -> Self {
        Self::new(Utc::now().date_naive())
    }

    pub fn with_next_version(mut self, version: impl Into<String>) -> Self {
        self.next_version = Some(version.into());
        self
    }

    pub fn with_eol_lead(mut self, lead: TimeDelta) -> Self {
        self.eol_lead = Some(lead);
        self
    }

    pub fn with_bol_lead(mut self, lead: TimeDelta) -> Self {
        self.bol_lead = Some(lead);
        self
    }

    /// Whether `date`, brought forward by `lead`, has been reached.
    fn reached(&self, date: NaiveDate, lead: Option<TimeDelta>) -> bool {
        let lead = lead.unwrap_or_else(TimeDelta::zero);
        match date.checked_sub_signed(lead) {
            Some(threshold) => self.today >= threshold,
            None => true,
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("version error: {0}")]
    Version(#[from] VersionError),

    #[error("directive line {origin_line} is outside a buffer of {len} lines")]
    OriginOutOfRange { origin_line: usize, len: usize },

    #[error("directive on line {origin_line} has no code to replace")]
    EmptyScope { origin_line: usize },

    #[error("directive on line {origin_line} refers to line {line} of its scope, outside the file")]
    LineOutOfRange { origin_line: usize, line: usize },

    #[error("directive on line {origin_line} has an invalid regex '{pattern}': {source}")]
    InvalidRegex {
        origin_line: usize,
        pattern: String,
        source: regex::Error,
    },
}

/// Status of a directive in check mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// The condition holds. `date` is the lifecycle date for `eol`/`bol`.
    Due { date: Option<NaiveDate> },
    /// The condition will hold on `date`, which falls within the lead time.
    Approaching { date: NaiveDate, remaining_days: i64 },
    NotDue,
}

/// Result of [`apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "FixOutcome tells whether the buffer changed or the file must go"]
pub enum FixOutcome {
    /// The condition does not hold; the buffer is untouched.
    NotDue,
    /// The buffer was edited.
    Applied,
    /// The buffer was emptied and the underlying file should be deleted.
    RemoveFile,
}

impl FixOutcome {
    pub fn is_fixed(&self) -> bool {
        !matches!(self, FixOutcome::NotDue)
    }
}

fn lifecycle_date(
    directive: &Directive,
    lifecycle: &dyn Lifecycle,
) -> Result<Option<NaiveDate>, LifecycleError> {
    match directive.kind {
        Kind::Bump => Ok(None),
        Kind::Eol => Ok(Some(lifecycle.dates(&directive.version)?.end_of_life)),
        Kind::Bol => Ok(Some(lifecycle.dates(&directive.version)?.first_release)),
    }
}

fn lead_for(kind: Kind, inputs: &TriggerInputs) -> Option<TimeDelta> {
    match kind {
        Kind::Eol => inputs.eol_lead,
        Kind::Bol => inputs.bol_lead,
        Kind::Bump => None,
    }
}

/// Whether the directive's trigger condition currently holds.
pub fn evaluate(
    directive: &Directive,
    inputs: &TriggerInputs,
    lifecycle: &dyn Lifecycle,
) -> Result<bool, EditError> {
    if directive.kind == Kind::Bump {
        return match &inputs.next_version {
            Some(next) => Ok(has_reached(next, &directive.version)?),
            None => Ok(false),
        };
    }

    let date = lifecycle_date(directive, lifecycle)?;
    Ok(date.is_some_and(|date| inputs.reached(date, lead_for(directive.kind, inputs))))
}

/// Classify a directive for reporting: due, approaching within the lead
/// time, or not due.
pub fn check(
    directive: &Directive,
    inputs: &TriggerInputs,
    lifecycle: &dyn Lifecycle,
) -> Result<CheckStatus, EditError> {
    let Some(date) = lifecycle_date(directive, lifecycle)? else {
        let due = evaluate(directive, inputs, lifecycle)?;
        return Ok(if due {
            CheckStatus::Due { date: None }
        } else {
            CheckStatus::NotDue
        });
    };

    if inputs.reached(date, None) {
        Ok(CheckStatus::Due { date: Some(date) })
    } else if lead_for(directive.kind, inputs)
        .is_some_and(|lead| inputs.reached(date, Some(lead)))
    {
        Ok(CheckStatus::Approaching {
            date,
            remaining_days: (date - inputs.today).num_days(),
        })
    } else {
        Ok(CheckStatus::NotDue)
    }
}

/// A planned replacement of `range` by `lines`.
struct Splice {
    range: Range<usize>,
    lines: Vec<String>,
}

/// Apply the directive to `buffer` if its condition holds.
///
/// The comment line is deleted and the directive's action is applied to
/// the code that followed it. Nothing is changed when an error is returned.
///
/// Precondition: directives below this one in the same buffer have already
/// been applied (descending `origin_line` order).
pub fn apply(
    directive: &Directive,
    buffer: &mut Vec<String>,
    inputs: &TriggerInputs,
    lifecycle: &dyn Lifecycle,
) -> Result<FixOutcome, EditError> {
    if !evaluate(directive, inputs, lifecycle)? {
        return Ok(FixOutcome::NotDue);
    }

    let comment = directive
        .origin_line
        .checked_sub(1)
        .filter(|index| *index < buffer.len())
        .ok_or(EditError::OriginOutOfRange {
            origin_line: directive.origin_line,
            len: buffer.len(),
        })?;

    let removed = buffer.remove(comment);
    match plan(directive, buffer, comment) {
        Ok(splice) => {
            buffer.splice(splice.range, splice.lines);
        }
        Err(e) => {
            buffer.insert(comment, removed);
            return Err(e);
        }
    }

    if directive.action.removes_file() {
        Ok(FixOutcome::RemoveFile)
    } else {
        Ok(FixOutcome::Applied)
    }
}

/// Work out the edit for a buffer whose comment line is already gone.
fn plan(directive: &Directive, buffer: &[String], start: usize) -> Result<Splice, EditError> {
    let origin_line = directive.origin_line;
    let range = scope_range(directive.action.scope(), buffer, start);

    let lines = match &directive.action {
        Action::Remove { .. } => Vec::new(),

        Action::Replace { target, .. } => {
            let first = buffer
                .get(range.start)
                .filter(|_| !range.is_empty())
                .ok_or(EditError::EmptyScope { origin_line })?;
            // `line` is the number as written in the directive.
            let line_at = |offset: Option<usize>, line: usize| {
                offset
                    .and_then(|offset| range.start.checked_add(offset))
                    .and_then(|index| buffer.get(index))
                    .cloned()
                    .ok_or(EditError::LineOutOfRange { origin_line, line })
            };

            let replacement = match target {
                ReplaceTarget::Line(line) => vec![line_at(line.checked_sub(1), *line)?],
                ReplaceTarget::Lines(lines) => lines
                    .iter()
                    .map(|line| line_at(Some(*line), *line))
                    .collect::<Result<Vec<_>, _>>()?,
                ReplaceTarget::Text(text) => vec![format!("{text}{}", line_terminator(first))],
            };
            reindent(&replacement, indent(first))
        }

        Action::Substitute {
            pattern,
            replacement,
            regex,
            ..
        } => {
            let scoped = &buffer[range.clone()];
            let substituted: Vec<String> = if *regex {
                let compiled = Regex::new(pattern).map_err(|source| EditError::InvalidRegex {
                    origin_line,
                    pattern: pattern.clone(),
                    source,
                })?;
                let replacement = expand_group_references(replacement);
                scoped
                    .iter()
                    .map(|line| {
                        // Match against the text only, so `$` anchors before the terminator.
                        let terminator = line_terminator(line);
                        let body = &line[..line.len() - terminator.len()];
                        let replaced = compiled.replace_all(body, replacement.as_str());
                        format!("{replaced}{terminator}")
                    })
                    .collect()
            } else {
                scoped
                    .iter()
                    .map(|line| line.replace(pattern.as_str(), replacement))
                    .collect()
            };
            match scoped.first() {
                Some(first) => reindent(&substituted, indent(first)),
                None => substituted,
            }
        }
    };

    Ok(Splice { range, lines })
}

/// Rewrite group references in a regex replacement into braced
/// `regex` syntax.
///
/// Accepts `\N`, `\g<N>` and `\g<name>` as well as `$N`, `$name` and
/// `${name}`. A numeric `$N` ends at the last digit, so `$1_new` is group 1
/// followed by `_new`. `\\` and `$$` stand for a literal backslash and
/// dollar sign; any other `$` is literal too.
pub fn expand_group_references(replacement: &str) -> String {
    let chars: Vec<char> = replacement.chars().collect();
    let mut out = String::with_capacity(replacement.len());
    let mut i = 0;

    let digits_from = |start: usize| {
        chars[start..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count()
    };
    let is_name = |name: &[char]| {
        !name.is_empty() && name.iter().all(|c| c.is_alphanumeric() || *c == '_')
    };

    while i < chars.len() {
        match (chars[i], chars.get(i + 1).copied()) {
            ('\\', Some(c)) if c.is_ascii_digit() => {
                let len = digits_from(i + 1);
                let group: String = chars[i + 1..i + 1 + len].iter().collect();
                out.push_str(&format!("${{{group}}}"));
                i += 1 + len;
            }
            ('\\', Some('g')) if chars.get(i + 2) == Some(&'<') => {
                let close = chars[i + 3..].iter().position(|c| *c == '>');
                match close {
                    Some(len) if is_name(&chars[i + 3..i + 3 + len]) => {
                        let group: String = chars[i + 3..i + 3 + len].iter().collect();
                        out.push_str(&format!("${{{group}}}"));
                        i += 4 + len;
                    }
                    _ => {
                        out.push('\\');
                        i += 1;
                    }
                }
            }
            ('\\', Some('\\')) => {
                out.push('\\');
                i += 2;
            }
            ('$', Some('$')) => {
                out.push_str("$$");
                i += 2;
            }
            ('$', Some('{')) => match chars[i + 2..].iter().position(|c| *c == '}') {
                Some(len) if is_name(&chars[i + 2..i + 2 + len]) => {
                    let group: String = chars[i + 2..i + 2 + len].iter().collect();
                    out.push_str(&format!("${{{group}}}"));
                    i += 3 + len;
                }
                _ => {
                    out.push_str("$$");
                    i += 1;
                }
            },
            ('$', Some(c)) if c.is_ascii_digit() => {
                let len = digits_from(i + 1);
                let group: String = chars[i + 1..i + 1 + len].iter().collect();
                out.push_str(&format!("${{{group}}}"));
                i += 1 + len;
            }
            ('$', Some(c)) if c.is_alphabetic() || c == '_' => {
                let len = chars[i + 1..]
                    .iter()
                    .take_while(|c| c.is_alphanumeric() || **c == '_')
                    .count();
                let group: String = chars[i + 1..i + 1 + len].iter().collect();
                out.push_str(&format!("${{{group}}}"));
                i += 1 + len;
            }
            ('$', _) => {
                out.push_str("$$");
                i += 1;
            }
            (c, _) => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}
