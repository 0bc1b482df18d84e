//! Cyclomatic complexity per function.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::lang::Language;

/// Cyclomatic complexity of a single function or method.
///
/// # Examples
///
/// ```
/// use quarry_metrics::FunctionComplexity;
///
/// let unit = FunctionComplexity {
///     name: "retry".into(),
///     line: 42,
///     complexity: 4,
/// };
/// assert!(unit.complexity >= 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionComplexity {
    /// Function or method name, `(anonymous)` for unnamed functions.
    pub name: String,
    /// Line number where the function starts (1-indexed).
    pub line: u32,
    /// Cyclomatic complexity: 1 + decision points.
    pub complexity: u32,
}

/// Compute cyclomatic complexity for every function in a parsed file.
///
/// A function's complexity is 1 plus the number of decision points in its
/// body: branches, loops, case arms, exception handlers, conditional
/// expressions, and short-circuit boolean operators. Nested functions are
/// reported separately and excluded from the enclosing function's count.
pub fn compute_complexity(root: Node<'_>, source: &str, language: Language) -> Vec<FunctionComplexity> {
    let mut functions = Vec::new();
    collect_functions(root, source, language, &mut functions);
    functions
}

fn collect_functions(
    node: Node<'_>,
    source: &str,
    language: Language,
    functions: &mut Vec<FunctionComplexity>,
) {
    if language.function_kinds().contains(&node.kind()) {
        let name = function_name(node, source, language);
        let mut decisions: u32 = 0;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            count_decisions(child, language, &mut decisions);
        }
        functions.push(FunctionComplexity {
            name,
            line: node.start_position().row as u32 + 1,
            complexity: 1 + decisions,
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_functions(child, source, language, functions);
    }
}

fn count_decisions(node: Node<'_>, language: Language, decisions: &mut u32) {
    // Nested functions own their decision points.
    if language.function_kinds().contains(&node.kind()) {
        return;
    }

    if language.decision_kinds().contains(&node.kind()) {
        *decisions += 1;
    }
    if !node.is_named() && language.bool_operator_tokens().contains(&node.kind()) {
        *decisions += 1;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        count_decisions(child, language, decisions);
    }
}

fn function_name(node: Node<'_>, source: &str, language: Language) -> String {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if language.name_kinds().contains(&child.kind()) {
            let start = child.start_byte();
            let end = child.end_byte();
            if start < end && end <= source.len() {
                return source[start..end].to_string();
            }
        }
    }
    "(anonymous)".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_source;

    fn complexity_for(language: Language, source: &str) -> Vec<FunctionComplexity> {
        let tree = parse_source(language, source).unwrap();
        compute_complexity(tree.root_node(), source, language)
    }

    #[test]
    fn straight_line_function_has_complexity_one() {
        let functions = complexity_for(Language::Python, "def simple():\n    return 1\n");
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "simple");
        assert_eq!(functions[0].complexity, 1);
        assert_eq!(functions[0].line, 1);
    }

    #[test]
    fn python_branches_and_bool_ops_add_points() {
        let source = "\
def branchy(x):
    if x > 0 and x < 10:
        return 1
    elif x < 0:
        return 2
    for i in range(3):
        if i:
            pass
    return 3
";
        let functions = complexity_for(Language::Python, source);
        let branchy = functions.iter().find(|f| f.name == "branchy").unwrap();
        // if + and + elif + for + inner if
        assert_eq!(branchy.complexity, 6);
    }

    #[test]
    fn nested_functions_are_counted_separately() {
        let source = "\
def outer():
    def inner(y):
        if y:
            return y
    return inner
";
        let functions = complexity_for(Language::Python, source);
        assert_eq!(functions.len(), 2);
        let outer = functions.iter().find(|f| f.name == "outer").unwrap();
        let inner = functions.iter().find(|f| f.name == "inner").unwrap();
        assert_eq!(outer.complexity, 1, "inner's branch must not leak out");
        assert_eq!(inner.complexity, 2);
    }

    #[test]
    fn rust_match_arms_each_add_a_point() {
        let source = "\
fn classify(n: i32) -> &'static str {
    if n > 0 && n < 10 {
        \"small\"
    } else {
        match n {
            0 => \"zero\",
            _ => \"other\",
        }
    }
}
";
        let functions = complexity_for(Language::Rust, source);
        let classify = functions.iter().find(|f| f.name == "classify").unwrap();
        // if + && + two match arms
        assert_eq!(classify.complexity, 5);
    }

    #[test]
    fn file_without_functions_yields_no_units() {
        let functions = complexity_for(Language::Python, "x = 1\ny = 2\n");
        assert!(functions.is_empty());
    }
}
