//! Static source-code metrics via tree-sitter.
//!
//! Parses source files with error-tolerant tree-sitter grammars and computes
//! the classic size and complexity measures: raw line counts (LOC, SLOC,
//! LLOC, comments, blank), cyclomatic complexity per function, the Halstead
//! suite, and the maintainability index. [`analyze_snapshot`] aggregates
//! per-file results into the per-commit totals and averages the miner
//! records.

mod complexity;
mod halstead;
mod lang;
mod maintainability;
mod raw;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use quarry_core::QuarryError;
use serde::{Deserialize, Serialize};

pub use complexity::{compute_complexity, FunctionComplexity};
pub use halstead::{compute_halstead, HalsteadMetrics};
pub use lang::Language;
pub use maintainability::maintainability_index;
pub use raw::{compute_raw, RawMetrics};

/// Map configured language names to the set of file extensions to mine.
///
/// Unknown names are ignored; duplicates collapse.
///
/// # Examples
///
/// ```
/// use quarry_metrics::extensions_for;
///
/// let exts = extensions_for(&["python".into(), "rust".into()]);
/// assert!(exts.contains(&"py".to_string()));
/// assert!(exts.contains(&"rs".to_string()));
/// ```
pub fn extensions_for(language_names: &[String]) -> Vec<String> {
    let mut extensions: Vec<String> = language_names
        .iter()
        .filter_map(|name| Language::from_name(name))
        .flat_map(|lang| lang.extensions().iter().map(|e| e.to_string()))
        .collect();
    extensions.sort();
    extensions.dedup();
    extensions
}

/// All metrics computed for a single source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetrics {
    /// Path relative to the repository root.
    pub path: PathBuf,
    /// Raw line counts.
    pub raw: RawMetrics,
    /// Cyclomatic complexity of every function in the file.
    pub functions: Vec<FunctionComplexity>,
    /// Halstead measures for the whole file.
    pub halstead: HalsteadMetrics,
    /// Maintainability index (0–100).
    pub mi: f64,
}

/// Metrics aggregated across every analyzed file of one commit.
///
/// Raw counts are summed; complexity, maintainability, and the Halstead
/// measures are averaged. Averages over an empty set are `None`, which the
/// results table serializes as an empty cell.
///
/// # Examples
///
/// ```
/// use quarry_metrics::CommitMetrics;
///
/// let m = CommitMetrics::default();
/// assert_eq!(m.loc, 0);
/// assert!(m.avg_complexity.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitMetrics {
    /// Total lines across analyzed files.
    pub loc: u64,
    /// Total logical lines across analyzed files.
    pub lloc: u64,
    /// Total source lines across analyzed files.
    pub sloc: u64,
    /// Total comment lines across analyzed files.
    pub comments: u64,
    /// Mean cyclomatic complexity across all functions.
    pub avg_complexity: Option<f64>,
    /// Mean maintainability index across files.
    pub avg_mi: Option<f64>,
    /// Mean Halstead vocabulary across files.
    pub avg_vocabulary: Option<f64>,
    /// Mean Halstead length across files.
    pub avg_length: Option<f64>,
    /// Mean Halstead volume across files.
    pub avg_volume: Option<f64>,
    /// Mean Halstead difficulty across files.
    pub avg_difficulty: Option<f64>,
    /// Mean Halstead effort across files.
    pub avg_effort: Option<f64>,
    /// Mean Halstead time across files.
    pub avg_time: Option<f64>,
    /// Mean Halstead bug estimate across files.
    pub avg_bugs: Option<f64>,
    /// Files successfully analyzed.
    pub files_analyzed: usize,
    /// Files skipped because their language is unknown or parsing failed.
    pub files_skipped: usize,
}

/// Analyze a single source file.
///
/// # Errors
///
/// Returns [`QuarryError::Parse`] if the file's language is unknown or the
/// grammar refuses the input outright. Syntax errors do not fail: tree-sitter
/// is error-tolerant and partial results are returned.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use quarry_metrics::analyze_file;
///
/// let metrics = analyze_file(Path::new("app.py"), "def f():\n    return 1\n").unwrap();
/// assert_eq!(metrics.raw.loc, 2);
/// assert_eq!(metrics.functions.len(), 1);
/// ```
pub fn analyze_file(path: &Path, content: &str) -> Result<FileMetrics, QuarryError> {
    let language = Language::from_path(path);
    let tree = parse_source(language, content)?;
    let root = tree.root_node();

    let raw = compute_raw(root, content, language);
    let functions = compute_complexity(root, content, language);
    let halstead = compute_halstead(root, content, language);

    let total_complexity: u64 = functions.iter().map(|f| u64::from(f.complexity)).sum();
    let comment_percent = if raw.loc > 0 {
        raw.comments as f64 / raw.loc as f64 * 100.0
    } else {
        0.0
    };
    let mi = maintainability_index(
        halstead.volume,
        total_complexity as f64,
        raw.sloc as f64,
        comment_percent,
    );

    Ok(FileMetrics {
        path: path.to_path_buf(),
        raw,
        functions,
        halstead,
        mi,
    })
}

/// Analyze every file of a commit snapshot and aggregate the results.
///
/// Files that cannot be analyzed are skipped and counted in
/// [`CommitMetrics::files_skipped`]; a bad file never fails the commit.
pub fn analyze_snapshot<'a, I>(files: I) -> CommitMetrics
where
    I: IntoIterator<Item = (&'a Path, &'a str)>,
{
    let mut metrics = CommitMetrics::default();
    let mut complexities: Vec<f64> = Vec::new();
    let mut mis: Vec<f64> = Vec::new();
    let mut halstead_lists: HashMap<&'static str, Vec<f64>> = HashMap::new();

    for (path, content) in files {
        let file = match analyze_file(path, content) {
            Ok(file) => file,
            Err(_) => {
                metrics.files_skipped += 1;
                continue;
            }
        };

        metrics.loc += file.raw.loc;
        metrics.lloc += file.raw.lloc;
        metrics.sloc += file.raw.sloc;
        metrics.comments += file.raw.comments;
        metrics.files_analyzed += 1;

        complexities.extend(file.functions.iter().map(|f| f64::from(f.complexity)));
        mis.push(file.mi);

        let h = &file.halstead;
        for (key, value) in [
            ("vocabulary", h.vocabulary as f64),
            ("length", h.length as f64),
            ("volume", h.volume),
            ("difficulty", h.difficulty),
            ("effort", h.effort),
            ("time", h.time),
            ("bugs", h.bugs),
        ] {
            halstead_lists.entry(key).or_default().push(value);
        }
    }

    metrics.avg_complexity = metric_avg(&complexities);
    metrics.avg_mi = metric_avg(&mis);
    metrics.avg_vocabulary = halstead_lists.get("vocabulary").and_then(|v| metric_avg(v));
    metrics.avg_length = halstead_lists.get("length").and_then(|v| metric_avg(v));
    metrics.avg_volume = halstead_lists.get("volume").and_then(|v| metric_avg(v));
    metrics.avg_difficulty = halstead_lists.get("difficulty").and_then(|v| metric_avg(v));
    metrics.avg_effort = halstead_lists.get("effort").and_then(|v| metric_avg(v));
    metrics.avg_time = halstead_lists.get("time").and_then(|v| metric_avg(v));
    metrics.avg_bugs = halstead_lists.get("bugs").and_then(|v| metric_avg(v));

    metrics
}

fn metric_avg(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn parse_source(
    language: Language,
    content: &str,
) -> Result<tree_sitter::Tree, QuarryError> {
    let Some(grammar) = language.grammar() else {
        return Err(QuarryError::Parse(format!(
            "no grammar for language '{language}'"
        )));
    };

    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| QuarryError::Parse(format!("failed to set language: {e}")))?;

    parser
        .parse(content, None)
        .ok_or_else(|| QuarryError::Parse("parser returned no tree".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_file_rejects_unknown_language() {
        let result = analyze_file(Path::new("notes.txt"), "hello");
        assert!(result.is_err());
    }

    #[test]
    fn analyze_file_tolerates_syntax_errors() {
        // Broken code still yields partial metrics.
        let result = analyze_file(Path::new("broken.py"), "def oops(:\n    pass\n");
        assert!(result.is_ok());
        assert_eq!(result.unwrap().raw.loc, 2);
    }

    #[test]
    fn file_metrics_are_consistent() {
        let source = "\
# helper module
def add(a, b):
    return a + b

def pick(x):
    if x:
        return 1
    return 2
";
        let metrics = analyze_file(Path::new("m.py"), source).unwrap();
        assert_eq!(metrics.raw.loc, 8);
        assert_eq!(metrics.functions.len(), 2);
        let pick = metrics.functions.iter().find(|f| f.name == "pick").unwrap();
        assert_eq!(pick.complexity, 2);
        assert!(metrics.mi > 0.0 && metrics.mi <= 100.0);
        assert!(metrics.halstead.vocabulary > 0);
    }

    #[test]
    fn snapshot_aggregates_totals_and_averages() {
        let a = "def a():\n    return 1\n";
        let b = "def b(x):\n    if x:\n        return x\n    return 0\n";
        let files = [
            (Path::new("a.py"), a),
            (Path::new("b.py"), b),
        ];
        let metrics = analyze_snapshot(files);

        assert_eq!(metrics.files_analyzed, 2);
        assert_eq!(metrics.files_skipped, 0);
        assert_eq!(metrics.loc, 6);
        // functions: a=1, b=2
        assert_eq!(metrics.avg_complexity, Some(1.5));
        assert!(metrics.avg_mi.is_some());
        assert!(metrics.avg_volume.unwrap() > 0.0);
    }

    #[test]
    fn snapshot_skips_unparseable_files() {
        let files = [
            (Path::new("ok.py"), "x = 1\n"),
            (Path::new("data.bin"), "\u{1}\u{2}"),
        ];
        let metrics = analyze_snapshot(files);
        assert_eq!(metrics.files_analyzed, 1);
        assert_eq!(metrics.files_skipped, 1);
    }

    #[test]
    fn empty_snapshot_has_no_averages() {
        let metrics = analyze_snapshot(std::iter::empty::<(&Path, &str)>());
        assert_eq!(metrics.files_analyzed, 0);
        assert_eq!(metrics.loc, 0);
        assert!(metrics.avg_complexity.is_none());
        assert!(metrics.avg_mi.is_none());
        assert!(metrics.avg_bugs.is_none());
    }

    #[test]
    fn extensions_for_dedupes_and_ignores_unknown() {
        let exts = extensions_for(&[
            "python".into(),
            "py".into(),
            "typescript".into(),
            "cobol".into(),
        ]);
        assert_eq!(
            exts,
            vec!["py".to_string(), "ts".to_string(), "tsx".to_string()]
        );
    }
}
