//! Halstead complexity metrics.
//!
//! Operators are the language's operator tokens; operands are identifiers
//! and literals. The derived measures follow Halstead's classic definitions,
//! with `time = effort / 18` and `bugs = volume / 3000`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::lang::Language;
use crate::raw::is_docstring;

/// Halstead measures for one source file.
///
/// # Examples
///
/// ```
/// use quarry_metrics::HalsteadMetrics;
///
/// let h = HalsteadMetrics::default();
/// assert_eq!(h.vocabulary, 0);
/// assert_eq!(h.volume, 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HalsteadMetrics {
    /// Distinct operators (n1).
    pub distinct_operators: u64,
    /// Distinct operands (n2).
    pub distinct_operands: u64,
    /// Total operator occurrences (N1).
    pub total_operators: u64,
    /// Total operand occurrences (N2).
    pub total_operands: u64,
    /// `n1 + n2`.
    pub vocabulary: u64,
    /// `N1 + N2`.
    pub length: u64,
    /// `length * log2(vocabulary)`.
    pub volume: f64,
    /// `(n1 / 2) * (N2 / n2)`.
    pub difficulty: f64,
    /// `difficulty * volume`.
    pub effort: f64,
    /// `effort / 18` seconds.
    pub time: f64,
    /// `volume / 3000`.
    pub bugs: f64,
}

/// Compute Halstead metrics from a parsed syntax tree.
pub fn compute_halstead(root: Node<'_>, source: &str, language: Language) -> HalsteadMetrics {
    let mut counter = TokenCounter {
        source,
        language,
        operators: HashSet::new(),
        operands: HashSet::new(),
        total_operators: 0,
        total_operands: 0,
    };
    counter.visit(root);

    let n1 = counter.operators.len() as u64;
    let n2 = counter.operands.len() as u64;
    let big_n1 = counter.total_operators;
    let big_n2 = counter.total_operands;

    let vocabulary = n1 + n2;
    let length = big_n1 + big_n2;
    let volume = if vocabulary > 0 {
        length as f64 * (vocabulary as f64).log2()
    } else {
        0.0
    };
    let difficulty = if n2 > 0 {
        (n1 as f64 / 2.0) * (big_n2 as f64 / n2 as f64)
    } else {
        0.0
    };
    let effort = difficulty * volume;

    HalsteadMetrics {
        distinct_operators: n1,
        distinct_operands: n2,
        total_operators: big_n1,
        total_operands: big_n2,
        vocabulary,
        length,
        volume,
        difficulty,
        effort,
        time: effort / 18.0,
        bugs: volume / 3000.0,
    }
}

struct TokenCounter<'a> {
    source: &'a str,
    language: Language,
    operators: HashSet<String>,
    operands: HashSet<String>,
    total_operators: u64,
    total_operands: u64,
}

impl TokenCounter<'_> {
    fn visit(&mut self, node: Node<'_>) {
        let kind = node.kind();

        if self.language.comment_kinds().contains(&kind) || is_docstring(node, self.language) {
            return;
        }

        // Operand nodes are counted whole so composite literals (strings,
        // numbers with suffixes) contribute a single operand.
        if self.language.operand_kinds().contains(&kind) {
            self.operands.insert(self.node_text(node));
            self.total_operands += 1;
            return;
        }

        if node.child_count() == 0 {
            if self.language.operator_tokens().contains(&kind) {
                self.operators.insert(kind.to_string());
                self.total_operators += 1;
            }
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    fn node_text(&self, node: Node<'_>) -> String {
        let start = node.start_byte();
        let end = node.end_byte().min(self.source.len());
        if start >= end {
            return String::new();
        }
        self.source[start..end].to_string()
    }
}
