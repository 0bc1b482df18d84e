//! Per-repository result tables.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quarry_core::QuarryError;
use serde::{Deserialize, Serialize};

/// One row of a repository's results CSV: a commit with its change counts
/// and aggregated source metrics.
///
/// Average columns are empty when the commit had no analyzable files or
/// functions.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use quarry_report::CommitRecord;
///
/// let record = CommitRecord {
///     id: 0,
///     hash: "a".repeat(40),
///     author: "alice".into(),
///     date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
///     message: "initial".into(),
///     is_merge: false,
///     lines_changed: 3,
///     insertions: 3,
///     deletions: 0,
///     loc: 120,
///     lloc: 80,
///     sloc: 90,
///     comments: 12,
///     avg_complexity: Some(2.5),
///     avg_mi: Some(71.3),
///     avg_vocabulary: None,
///     avg_length: None,
///     avg_volume: None,
///     avg_difficulty: None,
///     avg_effort: None,
///     avg_time: None,
///     avg_bugs: None,
/// };
/// assert_eq!(record.lines_changed, record.insertions + record.deletions);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Row index after date sorting, contiguous from 0.
    pub id: u64,
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

/// Store for per-repository result tables under a results directory.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use quarry_report::ResultsStore;
///
/// let store = ResultsStore::new("data/results");
/// assert_eq!(
///     store.path_for("requests"),
///     PathBuf::from("data/results/requests.csv")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ResultsStore {
    dir: PathBuf,
}

impl ResultsStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The results directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the results table for `repo_name`.
    pub fn path_for(&self, repo_name: &str) -> PathBuf {
        self.dir.join(format!("{repo_name}.csv"))
    }

    /// Load all saved records for `repo_name`, oldest first.
    ///
    /// Returns an empty vec when no table exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Csv`] if an existing table cannot be parsed.
    pub fn load(&self, repo_name: &str) -> Result<Vec<CommitRecord>, QuarryError> {
        let path = self.path_for(repo_name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: CommitRecord = row?;
            records.push(record);
        }
        Ok(records)
    }

    /// Commit hashes already present in the results table, used to resume an
    /// interrupted run.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Csv`] if an existing table cannot be parsed.
    pub fn known_hashes(&self, repo_name: &str) -> Result<HashSet<String>, QuarryError> {
        Ok(self
            .load(repo_name)?
            .into_iter()
            .map(|r| r.hash)
            .collect())
    }

    /// Merge `new_records` into the repository's table and rewrite it.
    ///
    /// Existing rows are kept, duplicate hashes collapse (first occurrence
    /// wins), rows are sorted by date ascending, and `id` is reassigned
    /// contiguously from 0. Returns the total number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Io`] or [`QuarryError::Csv`] on failure.
    pub fn save(
        &self,
        repo_name: &str,
        new_records: Vec<CommitRecord>,
    ) -> Result<usize, QuarryError> {
        let mut records = self.load(repo_name)?;
        records.extend(new_records);

        let mut seen: HashSet<String> = HashSet::new();
        records.retain(|r| seen.insert(r.hash.clone()));
        records.sort_by_key(|r| r.date);
        for (index, record) in records.iter_mut().enumerate() {
            record.id = index as u64;
        }

        std::fs::create_dir_all(&self.dir)?;
        let mut writer = csv::Writer::from_path(self.path_for(repo_name))?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        Ok(records.len())
    }
}

#[cfg(test)]
pub(crate) fn sample_record(hash: &str, timestamp: i64) -> CommitRecord {
    use chrono::TimeZone;

    CommitRecord {
        id: 0,
        hash: hash.into(),
        author: "alice".into(),
        date: chrono::Utc.timestamp_opt(timestamp, 0).unwrap(),
        message: format!("commit {hash}"),
        is_merge: false,
        lines_changed: 5,
        insertions: 4,
        deletions: 1,
        loc: 100,
        lloc: 60,
        sloc: 80,
        comments: 10,
        avg_complexity: Some(2.0),
        avg_mi: Some(80.0),
        avg_vocabulary: Some(12.0),
        avg_length: Some(30.0),
        avg_volume: Some(107.5),
        avg_difficulty: Some(3.2),
        avg_effort: Some(344.1),
        avg_time: Some(19.1),
        avg_bugs: Some(0.03),
    }
}
