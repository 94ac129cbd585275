//! # Comment Lexer
//!
//! Splits a raw comment block into marker lines and prose. A marker line is
//! any line whose first character after the comment leader is `+` followed
//! by a letter; everything else is prose and feeds descriptions.

use markgen_core::Location;

/// One marker line, prefix stripped, not yet bound to a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMarker {
    /// Line text after the `+` sigil, trailing whitespace removed.
    pub text: String,
    /// Originating comment block.
    pub location: Location,
    /// Zero-based line index within the block.
    pub line: usize,
}

/// Strip a `//`, `///`, `#`, or `*` comment leader and surrounding blanks.
pub fn strip_comment_leader(line: &str) -> &str {
    let t = line.trim();
    let t = if let Some(rest) = t.strip_prefix("//") {
        rest.trim_start_matches('/')
    } else if let Some(rest) = t.strip_prefix('#') {
        rest
    } else if let Some(rest) = t.strip_prefix('*') {
        rest
    } else {
        t
    };
    t.trim()
}

/// The marker body of a line, or `None` for prose.
pub fn marker_body(line: &str) -> Option<&str> {
    let body = strip_comment_leader(line).strip_prefix('+')?;
    if body.starts_with(|c: char| c.is_ascii_alphabetic()) {
        Some(body)
    } else {
        None
    }
}

/// Every entry yields at least one line, so an empty entry still counts.
fn physical_lines(lines: &[String]) -> impl Iterator<Item = &str> {
    lines
        .iter()
        .flat_map(|l| l.split('\n'))
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
}

/// Every marker line in a comment block, in order.
pub fn raw_markers(lines: &[String], location: &Location) -> Vec<RawMarker> {
    physical_lines(lines)
        .enumerate()
        .filter_map(|(i, line)| {
            marker_body(line).map(|body| RawMarker {
                text: body.to_string(),
                location: location.clone(),
                line: i,
            })
        })
        .collect()
}

/// The prose of a comment block: marker lines dropped, consecutive lines
/// joined with spaces, paragraphs separated by a newline.
pub fn description(lines: &[String]) -> Option<String> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in physical_lines(lines) {
        if marker_body(line).is_some() {
            continue;
        }
        let text = strip_comment_leader(line);
        if text.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(text);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n"))
    }
}
