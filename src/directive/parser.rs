//! Directive grammar.
//!
//! ```text
//! # PREFIX: <bump|eol|bol> <VERSION>: remove <block|file|line>.
//! # PREFIX: <bump|eol|bol> <VERSION>: replace <block|file|line> with line <N>.
//! # PREFIX: <bump|eol|bol> <VERSION>: replace <block|file|line> with lines <N-M, ...>.
//! # PREFIX: <bump|eol|bol> <VERSION>: replace <block|file|line> with `<TEXT>`.
//! # PREFIX: <bump|eol|bol> <VERSION>: [regex-]replace `<A>` with `<B>` within <block|file|line>.
//! ```
//!
//! Keywords are case-insensitive and whitespace between tokens is free.
//! Anything after the directive body (usually a full stop and an
//! explanation) is ignored.

use super::{Action, Directive, Kind, ReplaceTarget, Scope};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "YORE";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The prefix matched but the rest of the comment did not.
    #[error("malformed {prefix} comment on line {line}: {text}")]
    Malformed {
        prefix: String,
        line: usize,
        text: String,
    },

    #[error("invalid line list '{0}'")]
    InvalidLineList(String),

    #[error("invalid directive prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: String },
}

/// Compiled directive grammar for one prefix.
#[derive(Debug, Clone)]
pub struct DirectiveParser {
    prefix: String,
    directive: Regex,
    leader: Regex,
}

impl DirectiveParser {
    pub fn new(prefix: &str) -> Result<Self, ParseError> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(ParseError::InvalidPrefix {
                prefix: prefix.to_string(),
                reason: "prefix is empty".to_string(),
            });
        }
        let escaped = regex::escape(prefix);

        let pattern = [
            r"^\s*#\s*",
            &escaped,
            r":\s*(?P<kind>bump|eol|bol)\s+(?P<version>[^:]+):\s*(?:",
            r"remove\s+(?P<remove>block|file|line)",
            r"|replace\s+(?P<replace>block|file|line)\s+with\s+(?:",
            r"line\s+(?P<line>\d+)",
            r"|lines\s+(?P<lines>[\d,\s-]+)",
            r"|`(?P<string>.+)`",
            r")",
            r"|(?P<regex>regex-)?replace\s+`(?P<pattern1>.+)`\s+with\s+`(?P<pattern2>.*)`\s+within\s+(?P<within>block|file|line)",
            r")\.?.*$",
        ]
        .concat();

        let build = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| ParseError::InvalidPrefix {
                    prefix: prefix.to_string(),
                    reason: e.to_string(),
                })
        };

        Ok(Self {
            prefix: prefix.to_string(),
            directive: build(&pattern)?,
            leader: build(&format!(r"^\s*#\s*{escaped}:"))?,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parse one line found at `origin_line` (1-based).
    ///
    /// Lines that do not match the grammar, including malformed comments
    /// that carry the prefix, are not directives.
    pub fn parse(&self, text: &str, origin_line: usize) -> Option<Directive> {
        self.parse_strict(text, origin_line).ok().flatten()
    }

    /// Like [`parse`](Self::parse), but a line that starts with the prefix
    /// and then fails the grammar is reported as [`ParseError::Malformed`].
    pub fn parse_strict(
        &self,
        text: &str,
        origin_line: usize,
    ) -> Result<Option<Directive>, ParseError> {
        let text = text.trim_end_matches(['\n', '\r']);

        if !self.leader.is_match(text) {
            return Ok(None);
        }

        let malformed = || ParseError::Malformed {
            prefix: self.prefix.clone(),
            line: origin_line,
            text: text.trim().to_string(),
        };

        let caps = self.directive.captures(text).ok_or_else(malformed)?;

        let kind = match caps["kind"].to_ascii_lowercase().as_str() {
            "bump" => Kind::Bump,
            "eol" => Kind::Eol,
            _ => Kind::Bol,
        };
        let version = caps["version"].trim().to_string();

        let action = if let Some(scope) = caps.name("remove") {
            Action::Remove {
                scope: parse_scope(scope.as_str()),
            }
        } else if let Some(scope) = caps.name("replace") {
            let target = if let Some(line) = caps.name("line") {
                ReplaceTarget::Line(line.as_str().parse().map_err(|_| malformed())?)
            } else if let Some(lines) = caps.name("lines") {
                ReplaceTarget::Lines(parse_line_list(lines.as_str()).map_err(|_| malformed())?)
            } else if let Some(string) = caps.name("string") {
                ReplaceTarget::Text(string.as_str().to_string())
            } else {
                return Err(malformed());
            };
            Action::Replace {
                scope: parse_scope(scope.as_str()),
                target,
            }
        } else if let Some(scope) = caps.name("within") {
            Action::Substitute {
                scope: parse_scope(scope.as_str()),
                pattern: caps["pattern1"].to_string(),
                replacement: caps
                    .name("pattern2")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                regex: caps.name("regex").is_some(),
            }
        } else {
            return Err(malformed());
        };

        Ok(Some(Directive {
            kind,
            version,
            origin_line,
            action,
        }))
    }
}

impl Default for DirectiveParser {
    fn default() -> Self {
        // The default prefix is a plain word, so compilation cannot fail.
        Self::new(DEFAULT_PREFIX).expect("default prefix compiles")
    }
}

/// Parse a single line with the given prefix, as if it were line 1.
pub fn parse_directive(text: &str, prefix: &str) -> Option<Directive> {
    DirectiveParser::new(prefix).ok()?.parse(text, 1)
}

fn parse_scope(scope: &str) -> Scope {
    match scope.to_ascii_lowercase().as_str() {
        "block" => Scope::Block,
        "file" => Scope::File,
        _ => Scope::Line,
    }
}

/// Largest line number a line list may name.
pub const MAX_LINE_NUMBER: usize = 100_000;

/// Expand a line list such as `1-3, 5 7` into `[1, 2, 3, 5, 7]`.
///
/// Commas and whitespace both separate items and may repeat. Ranges are
/// inclusive and must not run backwards. Order is kept and duplicates are
/// not removed. Numbers above [`MAX_LINE_NUMBER`] are rejected, and so is a
/// list expanding to more than that many entries.
pub fn parse_line_list(input: &str) -> Result<Vec<usize>, ParseError> {
    let invalid = || ParseError::InvalidLineList(input.to_string());
    let mut lines = Vec::new();

    for item in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
    {
        match item.split_once('-') {
            Some((start, end)) => {
                let start = parse_line_number(start).ok_or_else(invalid)?;
                let end = parse_line_number(end).ok_or_else(invalid)?;
                if end < start {
                    return Err(invalid());
                }
                lines.extend(start..=end);
            }
            None => lines.push(parse_line_number(item).ok_or_else(invalid)?),
        }
        if lines.len() > MAX_LINE_NUMBER {
            return Err(invalid());
        }
    }

    Ok(lines)
}

fn parse_line_number(text: &str) -> Option<usize> {
    text.parse()
        .ok()
        .filter(|number| *number <= MAX_LINE_NUMBER)
}
