//! Yore: manage legacy code with comments that say when it can go.
//!
//! A Yore comment ties a piece of code to a future condition: a project
//! version bump, or a dependency version reaching its end of life (or its
//! first release). Once the condition holds, the comment tells how to rewrite
//! the code:
//!
//! ```text
//! # YORE: EOL 3.8: Replace block with line 4.
//! if sys.version_info < (3, 9):
//!     from astunparse import unparse
//! else:
//!     from ast import unparse
//! ```
//!
//! # Architecture
//!
//! - [`directive`] parses one comment line into a [`Directive`].
//! - [`buffer`] resolves the line/block/file scope of a directive from text
//!   indentation alone, without parsing the target language.
//! - [`editor`] evaluates the trigger and edits the in-memory line buffer.
//! - [`session`] applies every directive of a file bottom-to-top, so edits
//!   never shift the lines of directives still waiting to be applied.
//!
//! # Example
//!
//! ```
//! use yore::{apply, parse_directive, split_lines, StaticLifecycle, TriggerInputs};
//!
//! let text = "# YORE: Bump 1.0: Remove line.\nlegacy()\nmodern()\n";
//! let mut buffer = split_lines(text);
//! let mut directive = parse_directive(&buffer[0], "YORE").unwrap();
//! directive.origin_line = 1;
//!
//! let inputs = TriggerInputs::today().with_next_version("1.0.0");
//! let outcome = apply(&directive, &mut buffer, &inputs, &StaticLifecycle::new()).unwrap();
//!
//! assert!(outcome.is_fixed());
//! assert_eq!(buffer.concat(), "modern()\n");
//! ```

pub mod buffer;
pub mod config;
pub mod directive;
pub mod duration;
pub mod editor;
pub mod lifecycle;
pub mod scan;
pub mod session;
pub mod version;

// Re-exports
pub use buffer::{block_size, join_lines, reindent, scope_range, split_lines};
pub use config::{ConfigError, YoreConfig};
pub use directive::{
    parse_directive, parse_line_list, Action, Directive, DirectiveParser, Kind, ParseError,
    ReplaceTarget, Scope, DEFAULT_PREFIX,
};
pub use duration::{natural_delta, parse_lead_time, DurationError};
pub use editor::{apply, check, evaluate, CheckStatus, EditError, FixOutcome, TriggerInputs};
pub use lifecycle::{
    Lifecycle, LifecycleDates, LifecycleError, LifecycleTable, ReleaseCycleSource,
    StaticLifecycle,
};
pub use scan::{collect_directives, source_files, ScanError, ScanOptions};
pub use session::{check_file, fix_buffer, fix_file, Context, FileFix, FileOutcome, Finding};
pub use version::{has_reached, parse_version, VersionError};
