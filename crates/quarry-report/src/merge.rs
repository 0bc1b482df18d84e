//! Merging per-repository results into one combined table.

use std::path::Path;

use chrono::{DateTime, Utc};
use quarry_core::QuarryError;
use serde::{Deserialize, Serialize};

use crate::results::CommitRecord;

/// Name of the combined output table.
pub const ALL_RESULTS_FILE: &str = "_all_results.csv";

/// A row of `_all_results.csv`: a [`CommitRecord`] tagged with the
/// repository it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    /// Row index after date sorting, contiguous from 0.
    pub id: u64,
    /// Repository the commit belongs to (results file stem).
    pub repo_name: String,
    /// Full hex commit hash.
    pub hash: String,
    /// Author name.
    pub author: String,
    /// Commit time in UTC.
    pub date: DateTime<Utc>,
    /// Full commit message.
    pub message: String,
    /// Whether the commit has more than one parent.
    pub is_merge: bool,
    /// Insertions plus deletions.
    pub lines_changed: u64,
    /// Lines added against the first parent.
    pub insertions: u64,
    /// Lines deleted against the first parent.
    pub deletions: u64,
    /// Total lines across analyzed files.
    pub loc: u64,
    /// Total logical lines across analyzed files.
    pub lloc: u64,
    /// Total source lines across analyzed files.
    pub sloc: u64,
    /// Total comment lines across analyzed files.
    pub comments: u64,
    /// Mean cyclomatic complexity across functions.
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
}

impl MergedRecord {
    fn from_record(repo_name: &str, record: CommitRecord) -> Self {
        Self {
            id: 0,
            repo_name: repo_name.to_string(),
            hash: record.hash,
            author: record.author,
            date: record.date,
            message: record.message,
            is_merge: record.is_merge,
            lines_changed: record.lines_changed,
            insertions: record.insertions,
            deletions: record.deletions,
            loc: record.loc,
            lloc: record.lloc,
            sloc: record.sloc,
            comments: record.comments,
            avg_complexity: record.avg_complexity,
            avg_mi: record.avg_mi,
            avg_vocabulary: record.avg_vocabulary,
            avg_length: record.avg_length,
            avg_volume: record.avg_volume,
            avg_difficulty: record.avg_difficulty,
            avg_effort: record.avg_effort,
            avg_time: record.avg_time,
            avg_bugs: record.avg_bugs,
        }
    }
}

/// Outcome of a merge run.
///
/// # Examples
///
/// ```
/// use quarry_report::MergeSummary;
///
/// let summary = MergeSummary {
///     files_merged: 3,
///     rows_written: 1200,
///     duplicates_dropped: 4,
/// };
/// assert_eq!(summary.files_merged, 3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Per-repository tables read.
    pub files_merged: usize,
    /// Rows in the combined table.
    pub rows_written: usize,
    /// Rows dropped because their hash was already present.
    pub duplicates_dropped: usize,
}

/// Merge every per-repository table under `results_dir` into
/// `_all_results.csv`.
///
/// Rows are tagged with their repository name (the source file's stem),
/// duplicate hashes are dropped (first occurrence wins), rows are sorted by
/// date ascending, and `id` is reassigned. A previous combined table is
/// never read as input and is overwritten.
///
/// # Errors
///
/// Returns [`QuarryError::Io`] if the directory cannot be read, or
/// [`QuarryError::Csv`] if a table cannot be parsed.
pub fn merge_results(results_dir: &Path) -> Result<MergeSummary, QuarryError> {
    let mut sources: Vec<std::path::PathBuf> = Vec::new();
    for entry in std::fs::read_dir(results_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_csv = path.extension().and_then(|e| e.to_str()) == Some("csv");
        let is_combined = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n == ALL_RESULTS_FILE)
            .unwrap_or(false);
        if is_csv && !is_combined {
            sources.push(path);
        }
    }
    sources.sort();

    let mut merged: Vec<MergedRecord> = Vec::new();
    let mut seen_hashes = std::collections::HashSet::new();
    let mut duplicates_dropped = 0usize;

    for path in &sources {
        let repo_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let mut reader = csv::Reader::from_path(path)?;
        for row in reader.deserialize() {
            let record: CommitRecord = row?;
            if seen_hashes.insert(record.hash.clone()) {
                merged.push(MergedRecord::from_record(&repo_name, record));
            } else {
                duplicates_dropped += 1;
            }
        }
    }

    merged.sort_by_key(|r| r.date);
    for (index, record) in merged.iter_mut().enumerate() {
        record.id = index as u64;
    }

    let mut writer = csv::Writer::from_path(results_dir.join(ALL_RESULTS_FILE))?;
    for record in &merged {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(MergeSummary {
        files_merged: sources.len(),
        rows_written: merged.len(),
        duplicates_dropped,
    })
}
