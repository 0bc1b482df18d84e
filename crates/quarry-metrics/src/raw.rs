//! Raw line-count metrics: LOC, SLOC, LLOC, comment and blank lines.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::lang::Language;

/// Raw size metrics for one source file.
///
/// Line categories overlap deliberately: a line holding code and a trailing
/// comment counts toward both `sloc` and `comments`. For simple files,
/// `sloc + blank + comment-only lines = loc`.
///
/// # Examples
///
/// ```
/// use quarry_metrics::RawMetrics;
///
/// let raw = RawMetrics {
///     loc: 10,
///     sloc: 6,
///     lloc: 5,
///     comments: 3,
///     blank: 2,
/// };
/// assert!(raw.sloc <= raw.loc);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMetrics {
    /// Total lines in the file.
    pub loc: u64,
    /// Lines containing at least one code token.
    pub sloc: u64,
    /// Logical lines: number of statements and declarations.
    pub lloc: u64,
    /// Lines covered by comments (including docstrings and trailing comments).
    pub comments: u64,
    /// Whitespace-only lines.
    pub blank: u64,
}

/// Compute raw metrics from a parsed syntax tree.
///
/// Python docstrings (a string expression standing alone as a statement)
/// count as comment lines, matching how multiline documentation strings are
/// conventionally tallied.
pub fn compute_raw(root: Node<'_>, source: &str, language: Language) -> RawMetrics {
    let mut comment_lines: HashSet<usize> = HashSet::new();
    let mut code_lines: HashSet<usize> = HashSet::new();
    let mut statements: u64 = 0;

    visit(
        root,
        language,
        &mut comment_lines,
        &mut code_lines,
        &mut statements,
    );

    let loc = source.lines().count() as u64;
    let blank = source
        .lines()
        .filter(|line| line.trim().is_empty())
        .count() as u64;

    RawMetrics {
        loc,
        sloc: code_lines.len() as u64,
        lloc: statements,
        comments: comment_lines.len() as u64,
        blank,
    }
}

/// Whether `node` is a statement-like construct for logical line counting.
fn is_statement(kind: &str) -> bool {
    // `decorated_definition` wraps a `function_definition` that is counted on
    // its own, so it is excluded to avoid double counting.
    if kind == "decorated_definition" {
        return false;
    }
    kind.ends_with("_statement")
        || kind.ends_with("_declaration")
        || kind.ends_with("_definition")
        || kind.ends_with("_item")
}

/// Whether `node` is a Python docstring: a string standing alone as an
/// expression statement.
pub(crate) fn is_docstring(node: Node<'_>, language: Language) -> bool {
    language == Language::Python
        && node.kind() == "expression_statement"
        && node.named_child_count() == 1
        && node
            .named_child(0)
            .map(|c| c.kind() == "string")
            .unwrap_or(false)
}

fn visit(
    node: Node<'_>,
    language: Language,
    comment_lines: &mut HashSet<usize>,
    code_lines: &mut HashSet<usize>,
    statements: &mut u64,
) {
    let kind = node.kind();

    if language.comment_kinds().contains(&kind) || is_docstring(node, language) {
        for row in node.start_position().row..=node.end_position().row {
            comment_lines.insert(row);
        }
        return;
    }

    if is_statement(kind) {
        *statements += 1;
    }

    if node.child_count() == 0 {
        // Zero-width nodes (e.g. the root of an empty file) hold no code.
        if node.start_byte() < node.end_byte() {
            for row in node.start_position().row..=node.end_position().row {
                code_lines.insert(row);
            }
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, language, comment_lines, code_lines, statements);
    }
}
