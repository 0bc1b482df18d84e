use std::fmt;
use std::path::Path;

/// Programming language detected from a file extension.
///
/// Each supported language carries the tree-sitter grammar and the node-kind
/// tables the metric passes consult.
///
/// # Examples
///
/// ```
/// use quarry_metrics::Language;
///
/// assert_eq!(Language::from_extension("py"), Language::Python);
/// assert_eq!(Language::from_extension("rs"), Language::Rust);
/// assert_eq!(Language::from_extension("txt"), Language::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Go,
    Unknown,
}

impl Language {
    /// Detect language from a file extension string (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Language::Python,
            "rs" => Language::Rust,
            "js" | "jsx" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "go" => Language::Go,
            _ => Language::Unknown,
        }
    }

    /// Detect language from a file path.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use quarry_metrics::Language;
    ///
    /// assert_eq!(Language::from_path(Path::new("pkg/app.py")), Language::Python);
    /// assert_eq!(Language::from_path(Path::new("Makefile")), Language::Unknown);
    /// ```
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Language::Unknown, Self::from_extension)
    }

    /// Look up a language by its configuration name.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_metrics::Language;
    ///
    /// assert_eq!(Language::from_name("python"), Some(Language::Python));
    /// assert_eq!(Language::from_name("ts"), Some(Language::TypeScript));
    /// assert_eq!(Language::from_name("cobol"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "rust" | "rs" => Some(Language::Rust),
            "javascript" | "js" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            "go" | "golang" => Some(Language::Go),
            _ => None,
        }
    }

    /// File extensions (without the dot) associated with this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py"],
            Language::Rust => &["rs"],
            Language::JavaScript => &["js", "jsx"],
            Language::TypeScript => &["ts", "tsx"],
            Language::Go => &["go"],
            Language::Unknown => &[],
        }
    }

    /// Get the tree-sitter grammar for this language.
    ///
    /// Returns `None` for `Language::Unknown`.
    pub fn grammar(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
            Language::Unknown => None,
        }
    }

    /// Node kinds that are comments.
    pub(crate) fn comment_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Python | Language::JavaScript | Language::TypeScript | Language::Go => {
                &["comment"]
            }
            Language::Rust => &["line_comment", "block_comment"],
            Language::Unknown => &[],
        }
    }

    /// Node kinds that define a function or method body.
    pub(crate) fn function_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["function_definition"],
            Language::Rust => &["function_item"],
            Language::JavaScript | Language::TypeScript => &[
                "function_declaration",
                "function_expression",
                "generator_function_declaration",
                "arrow_function",
                "method_definition",
            ],
            Language::Go => &["function_declaration", "method_declaration", "func_literal"],
            Language::Unknown => &[],
        }
    }

    /// Node kinds that add one decision point to cyclomatic complexity.
    pub(crate) fn decision_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &[
                "if_statement",
                "elif_clause",
                "for_statement",
                "while_statement",
                "except_clause",
                "conditional_expression",
                "case_clause",
                "for_in_clause",
                "if_clause",
            ],
            Language::Rust => &[
                "if_expression",
                "while_expression",
                "for_expression",
                "loop_expression",
                "match_arm",
            ],
            Language::JavaScript | Language::TypeScript => &[
                "if_statement",
                "for_statement",
                "for_in_statement",
                "while_statement",
                "do_statement",
                "switch_case",
                "catch_clause",
                "ternary_expression",
            ],
            Language::Go => &[
                "if_statement",
                "for_statement",
                "expression_case",
                "type_case",
                "communication_case",
            ],
            Language::Unknown => &[],
        }
    }

    /// Short-circuit boolean operator tokens, each adding one decision point.
    pub(crate) fn bool_operator_tokens(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["and", "or"],
            Language::Rust | Language::Go => &["&&", "||"],
            Language::JavaScript | Language::TypeScript => &["&&", "||", "??"],
            Language::Unknown => &[],
        }
    }

    /// Tokens counted as Halstead operators.
    pub(crate) fn operator_tokens(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &[
                "+", "-", "*", "/", "//", "%", "**", "@", "==", "!=", "<", ">", "<=", ">=", "=",
                "+=", "-=", "*=", "/=", "//=", "%=", "**=", "&", "|", "^", "~", "<<", ">>", "and",
                "or", "not", "in", "is", ":=",
            ],
            Language::Rust => &[
                "+", "-", "*", "/", "%", "==", "!=", "<", ">", "<=", ">=", "=", "+=", "-=", "*=",
                "/=", "%=", "&&", "||", "!", "&", "|", "^", "<<", ">>", "?", "..", "..=",
            ],
            Language::JavaScript | Language::TypeScript => &[
                "+", "-", "*", "/", "%", "**", "==", "===", "!=", "!==", "<", ">", "<=", ">=",
                "=", "+=", "-=", "*=", "/=", "%=", "&&", "||", "??", "!", "&", "|", "^", "<<",
                ">>", ">>>", "typeof", "instanceof", "new", "delete", "in",
            ],
            Language::Go => &[
                "+", "-", "*", "/", "%", "==", "!=", "<", ">", "<=", ">=", "=", ":=", "+=", "-=",
                "*=", "/=", "%=", "&&", "||", "!", "&", "|", "^", "<<", ">>", "&^", "<-",
            ],
            Language::Unknown => &[],
        }
    }

    /// Named node kinds counted as Halstead operands.
    ///
    /// These nodes are counted whole; the walk does not descend into them,
    /// so composite literals like strings count once.
    pub(crate) fn operand_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &[
                "identifier",
                "integer",
                "float",
                "string",
                "true",
                "false",
                "none",
            ],
            Language::Rust => &[
                "identifier",
                "integer_literal",
                "float_literal",
                "string_literal",
                "raw_string_literal",
                "char_literal",
                "boolean_literal",
            ],
            Language::JavaScript | Language::TypeScript => &[
                "identifier",
                "property_identifier",
                "number",
                "string",
                "template_string",
                "regex",
                "true",
                "false",
                "null",
                "undefined",
            ],
            Language::Go => &[
                "identifier",
                "field_identifier",
                "int_literal",
                "float_literal",
                "interpreted_string_literal",
                "raw_string_literal",
                "rune_literal",
                "true",
                "false",
                "nil",
            ],
            Language::Unknown => &[],
        }
    }

    /// Node kinds holding a function's name.
    pub(crate) fn name_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Python | Language::Rust => &["identifier"],
            Language::JavaScript | Language::TypeScript => &["identifier", "property_identifier"],
            Language::Go => &["identifier", "field_identifier"],
            Language::Unknown => &[],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection_covers_variants() {
        assert_eq!(Language::from_extension("PY"), Language::Python);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("jsx"), Language::JavaScript);
        assert_eq!(Language::from_extension("go"), Language::Go);
        assert_eq!(Language::from_extension("c"), Language::Unknown);
    }

    #[test]
    fn every_known_language_has_a_grammar() {
        for lang in [
            Language::Python,
            Language::Rust,
            Language::JavaScript,
            Language::TypeScript,
            Language::Go,
        ] {
            assert!(lang.grammar().is_some(), "{lang} should have a grammar");
            assert!(!lang.extensions().is_empty());
        }
        assert!(Language::Unknown.grammar().is_none());
    }

    #[test]
    fn config_names_resolve() {
        assert_eq!(Language::from_name("Python"), Some(Language::Python));
        assert_eq!(Language::from_name("golang"), Some(Language::Go));
        assert_eq!(Language::from_name("fortran"), None);
    }

    #[test]
    fn display_matches_config_names() {
        assert_eq!(Language::Python.to_string(), "python");
        assert_eq!(
            Language::from_name(&Language::Go.to_string()),
            Some(Language::Go)
        );
    }
}
