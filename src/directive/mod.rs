//! Directive model: the structured form of one legacy-code comment.
//!
//! A directive is found on a single line of source, for example:
//!
//! ```text
//! # YORE: EOL 3.8: Replace block with line 4.
//! ```
//!
//! It carries what triggers it ([`Kind`] + version), where it was found
//! (`origin_line`) and what to do once it is due ([`Action`]).

pub mod parser;

pub use parser::{parse_directive, parse_line_list, DirectiveParser, ParseError, DEFAULT_PREFIX};

use std::fmt;

/// What condition triggers a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The project's next version reaches the directive's version.
    Bump,
    /// The dependency version reaches its end of life.
    Eol,
    /// The dependency version gets its first release.
    Bol,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Bump => "Bump",
            Kind::Eol => "EOL",
            Kind::Bol => "BOL",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The span of code an action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The line right after the comment.
    Line,
    /// The indentation-delimited block starting right after the comment.
    Block,
    /// The whole file.
    File,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Line => "line",
            Scope::Block => "block",
            Scope::File => "file",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the replacement of a `Replace` action comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
    /// One line of the scope, 1-based relative to the scope start.
    Line(usize),
    /// Several lines of the scope, offsets relative to the scope start.
    Lines(Vec<usize>),
    /// A literal line of text.
    Text(String),
}

/// What to do with the scoped code once the directive is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Remove {
        scope: Scope,
    },
    Replace {
        scope: Scope,
        target: ReplaceTarget,
    },
    /// Find/replace confined to the scope, as plain text or as a regex.
    Substitute {
        scope: Scope,
        pattern: String,
        replacement: String,
        regex: bool,
    },
}

impl Action {
    pub fn scope(&self) -> Scope {
        match self {
            Action::Remove { scope }
            | Action::Replace { scope, .. }
            | Action::Substitute { scope, .. } => *scope,
        }
    }

    /// Whether applying this action deletes the file rather than editing it.
    pub fn removes_file(&self) -> bool {
        matches!(self, Action::Remove { scope: Scope::File })
    }
}

/// A parsed directive comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: Kind,
    /// The dependency or project version the directive is about.
    pub version: String,
    /// 1-based line number of the comment in its buffer.
    pub origin_line: usize,
    pub action: Action,
}

impl Directive {
    /// Render the directive back as a comment line (without indentation or
    /// line terminator) that the parser accepts again.
    pub fn to_comment(&self, prefix: &str) -> String {
        format!("# {prefix}: {self}")
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: ", self.kind, self.version)?;
        match &self.action {
            Action::Remove { scope } => write!(f, "Remove {scope}."),
            Action::Replace { scope, target } => {
                write!(f, "Replace {scope} with ")?;
                match target {
                    ReplaceTarget::Line(line) => write!(f, "line {line}."),
                    ReplaceTarget::Lines(lines) => {
                        let joined = lines
                            .iter()
                            .map(|n| n.to_string())
                            .collect::<Vec<_>>()
                            .join(", ");
                        write!(f, "lines {joined}.")
                    }
                    ReplaceTarget::Text(text) => write!(f, "`{text}`."),
                }
            }
            Action::Substitute {
                scope,
                pattern,
                replacement,
                regex,
            } => {
                let keyword = if *regex { "Regex-replace" } else { "Replace" };
                write!(f, "{keyword} `{pattern}` with `{replacement}` within {scope}.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_scope() {
        let action = Action::Replace {
            scope: Scope::Block,
            target: ReplaceTarget::Line(4),
        };
        assert_eq!(action.scope(), Scope::Block);
        assert!(!action.removes_file());
        assert!(Action::Remove { scope: Scope::File }.removes_file());
        assert!(!Action::Remove { scope: Scope::Block }.removes_file());
    }

    #[test]
    fn test_display_regenerates_parseable_comment() {
        let directives = [
            Directive {
                kind: Kind::Eol,
                version: "3.8".to_string(),
                origin_line: 1,
                action: Action::Replace {
                    scope: Scope::Block,
                    target: ReplaceTarget::Line(4),
                },
            },
            Directive {
                kind: Kind::Bump,
                version: "1.0.0".to_string(),
                origin_line: 1,
                action: Action::Replace {
                    scope: Scope::Line,
                    target: ReplaceTarget::Lines(vec![1, 2, 5]),
                },
            },
            Directive {
                kind: Kind::Bol,
                version: "3.14".to_string(),
                origin_line: 1,
                action: Action::Substitute {
                    scope: Scope::File,
                    pattern: r"Union\[(\w+), None\]".to_string(),
                    replacement: "$1 | None".to_string(),
                    regex: true,
                },
            },
            Directive {
                kind: Kind::Eol,
                version: "3.9".to_string(),
                origin_line: 1,
                action: Action::Remove { scope: Scope::File },
            },
        ];

        for directive in directives {
            let comment = directive.to_comment(DEFAULT_PREFIX);
            let reparsed = parse_directive(&comment, DEFAULT_PREFIX)
                .unwrap_or_else(|| panic!("not reparsed: {comment}"));
            assert_eq!(reparsed, directive, "{comment}");
        }
    }

    #[test]
    fn test_display_text() {
        let directive = Directive {
            kind: Kind::Bump,
            version: "2".to_string(),
            origin_line: 3,
            action: Action::Replace {
                scope: Scope::Line,
                target: ReplaceTarget::Text("pass".to_string()),
            },
        };
        assert_eq!(
            directive.to_comment("YORE"),
            "# YORE: Bump 2: Replace line with `pass`."
        );
    }
}
