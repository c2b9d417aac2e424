//! Line buffers and indentation-based scope resolution.
//!
//! A buffer is a `Vec<String>` where every line keeps its terminator, so
//! joining the lines gives back the exact file contents. All indices here
//! are 0-based and refer to the buffer as it is *now*: every deletion or
//! insertion shifts the lines after it.

use crate::directive::Scope;
use std::ops::Range;

/// Split text into lines, keeping each line's terminator.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

/// Join lines back into file contents.
pub fn join_lines(lines: &[String]) -> String {
    lines.concat()
}

/// Number of leading whitespace characters.
pub fn indent(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Size of the indentation-delimited block starting at `start`.
///
/// The block covers every following line indented at least as deep as
/// `buffer[start]`. It ends at the first dedented line, or at a line at the
/// reference indentation that follows one or more blank lines. Trailing
/// blank lines are never part of the block.
pub fn block_size(buffer: &[String], start: usize) -> usize {
    let Some(first) = buffer.get(start) else {
        return 0;
    };
    let reference = indent(first);
    let mut size = 0;
    let mut pending_blank = 0;

    for line in &buffer[start..] {
        if is_blank(line) {
            pending_blank += 1;
        } else {
            let line_indent = indent(line);
            if line_indent < reference || (line_indent == reference && pending_blank > 0) {
                break;
            }
            pending_blank = 0;
        }
        size += 1;
    }

    size - pending_blank
}

/// Range of buffer indices covered by `scope` when the scoped code starts
/// at `start`. The range never extends past the end of the buffer.
pub fn scope_range(scope: Scope, buffer: &[String], start: usize) -> Range<usize> {
    let len = buffer.len();
    match scope {
        Scope::Line => start.min(len)..(start + 1).min(len),
        Scope::Block => {
            let start = start.min(len);
            start..start + block_size(buffer, start)
        }
        Scope::File => 0..len,
    }
}

/// Re-indent `lines` so their least indented line sits at `reference`
/// characters, keeping the relative indentation between them.
///
/// Blank lines are emitted as bare terminators and do not count towards
/// the common indentation.
pub fn reindent(lines: &[String], reference: usize) -> Vec<String> {
    let common = lines
        .iter()
        .filter(|line| !is_blank(line))
        .map(|line| indent(line))
        .min()
        .unwrap_or(0);
    let new_indent = " ".repeat(reference);

    lines
        .iter()
        .map(|line| {
            if is_blank(line) {
                return line_terminator(line).to_string();
            }
            let body: String = line.chars().skip(common).collect();
            format!("{new_indent}{body}")
        })
        .collect()
}

/// The line's terminator: `\r\n`, `\n` or nothing.
pub(crate) fn line_terminator(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
