//! The repository schedule: which repositories to mine, and which are done.

use std::path::Path;

use quarry_core::QuarryError;
use serde::{Deserialize, Serialize};

/// One row of the schedule CSV.
///
/// The file has columns `name`, `repo_url`, and `computed`. A schedule
/// without a `computed` column reads as entirely uncomputed.
///
/// # Examples
///
/// ```
/// use quarry_report::RepoEntry;
///
/// let entry = RepoEntry {
///     name: "requests".into(),
///     repo_url: "https://github.com/psf/requests".into(),
///     computed: false,
/// };
/// assert!(!entry.computed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    /// Short repository name.
    pub name: String,
    /// Clone URL. May be empty; empty entries are skipped but still marked
    /// computed.
    #[serde(default)]
    pub repo_url: String,
    /// Whether this repository's metrics have been collected.
    #[serde(default)]
    pub computed: bool,
}

/// Load the schedule from a CSV file.
///
/// # Errors
///
/// Returns [`QuarryError::FileNotFound`] if the file does not exist, or
/// [`QuarryError::Csv`] if a row cannot be parsed.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use quarry_report::load_schedule;
///
/// let entries = load_schedule(Path::new("data/urls.csv")).unwrap();
/// for e in &entries {
///     println!("{}: computed={}", e.name, e.computed);
/// }
/// ```
pub fn load_schedule(path: &Path) -> Result<Vec<RepoEntry>, QuarryError> {
    if !path.exists() {
        return Err(QuarryError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut entries = Vec::new();
    for row in reader.deserialize() {
        let entry: RepoEntry = row?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Rewrite the schedule CSV in full.
///
/// Called after each repository completes, so progress survives an
/// interrupted run.
///
/// # Errors
///
/// Returns [`QuarryError::Io`] or [`QuarryError::Csv`] on write failure.
pub fn save_schedule(path: &Path, entries: &[RepoEntry]) -> Result<(), QuarryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");

        let entries = vec![
            RepoEntry {
                name: "requests".into(),
                repo_url: "https://github.com/psf/requests".into(),
                computed: true,
            },
            RepoEntry {
                name: "flask".into(),
                repo_url: "https://github.com/pallets/flask".into(),
                computed: false,
            },
        ];
        save_schedule(&path, &entries).unwrap();

        let loaded = load_schedule(&path).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn missing_computed_column_defaults_to_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");
        std::fs::write(
            &path,
            "name,repo_url\nrequests,https://github.com/psf/requests\n",
        )
        .unwrap();

        let loaded = load_schedule(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded[0].computed);
        assert_eq!(loaded[0].name, "requests");
    }

    #[test]
    fn empty_url_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");
        std::fs::write(&path, "name,repo_url,computed\nghost,,false\n").unwrap();

        let loaded = load_schedule(&path).unwrap();
        assert_eq!(loaded[0].repo_url, "");
    }

    #[test]
    fn missing_file_is_a_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_schedule(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, QuarryError::FileNotFound(_)));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/url/urls.csv");
        save_schedule(&path, &[]).unwrap();
        assert!(path.exists());
    }
}
