//! In-memory snapshots of a commit's tree.
//!
//! Reads source file contents directly from git blobs, so computing metrics
//! for a historical commit never mutates the working tree or index.

use std::path::{Path, PathBuf};

use git2::{ObjectType, Oid, Repository, TreeWalkMode, TreeWalkResult};
use quarry_core::QuarryError;

/// Number of bytes checked for binary content.
const BINARY_CHECK_SIZE: usize = 8192;

/// A source file materialized from a commit's tree.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use quarry_mine::snapshot::SnapshotFile;
///
/// let file = SnapshotFile {
///     path: PathBuf::from("src/app.py"),
///     content: "print('hi')\n".into(),
/// };
/// assert_eq!(file.path, PathBuf::from("src/app.py"));
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    /// Path relative to the repository root.
    pub path: PathBuf,
    /// Full file content.
    pub content: String,
}

/// Read the source files of the tree at `hash`.
///
/// Only blobs whose extension is in `extensions` are returned. Files larger
/// than `max_file_kb` KiB, binary files (NUL byte in the first 8 KiB), and
/// non-UTF-8 files are skipped silently.
///
/// # Errors
///
/// Returns [`QuarryError::Git`] if the commit or its tree cannot be read.
///
/// # Examples
///
/// ```no_run
/// use git2::Repository;
/// use quarry_mine::snapshot::snapshot_at;
///
/// let repo = Repository::open(".").unwrap();
/// let head = repo.head().unwrap().target().unwrap().to_string();
/// let files = snapshot_at(&repo, &head, &["py".into()], 1024).unwrap();
/// for f in &files {
///     println!("{}: {} bytes", f.path.display(), f.content.len());
/// }
/// ```
pub fn snapshot_at(
    repo: &Repository,
    hash: &str,
    extensions: &[String],
    max_file_kb: u64,
) -> Result<Vec<SnapshotFile>, QuarryError> {
    let oid =
        Oid::from_str(hash).map_err(|e| QuarryError::Git(format!("invalid commit hash: {e}")))?;
    let commit = repo
        .find_commit(oid)
        .map_err(|e| QuarryError::Git(format!("failed to find commit {hash}: {e}")))?;
    let tree = commit
        .tree()
        .map_err(|e| QuarryError::Git(format!("failed to get tree for {hash}: {e}")))?;

    let max_bytes = max_file_kb.saturating_mul(1024);
    let mut files = Vec::new();

    tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() != Some(ObjectType::Blob) {
            return TreeWalkResult::Ok;
        }
        let Some(name) = entry.name() else {
            return TreeWalkResult::Ok;
        };
        if !matches_extension(name, extensions) {
            return TreeWalkResult::Ok;
        }

        let Ok(object) = entry.to_object(repo) else {
            return TreeWalkResult::Ok;
        };
        let Some(blob) = object.as_blob() else {
            return TreeWalkResult::Ok;
        };
        if blob.size() as u64 > max_bytes {
            return TreeWalkResult::Ok;
        }

        let content = blob.content();
        let check_len = content.len().min(BINARY_CHECK_SIZE);
        if content[..check_len].contains(&0) {
            return TreeWalkResult::Ok;
        }
        let Ok(text) = std::str::from_utf8(content) else {
            return TreeWalkResult::Ok;
        };

        files.push(SnapshotFile {
            path: PathBuf::from(format!("{root}{name}")),
            content: text.to_string(),
        });
        TreeWalkResult::Ok
    })
    .map_err(|e| QuarryError::Git(format!("failed to walk tree for {hash}: {e}")))?;

    Ok(files)
}

fn matches_extension(name: &str, extensions: &[String]) -> bool {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_gate_matches_file_names() {
        let exts = vec!["py".to_string(), "rs".to_string()];
        assert!(matches_extension("setup.py", &exts));
        assert!(matches_extension("lib.RS", &exts));
        assert!(!matches_extension("README.md", &exts));
        assert!(!matches_extension("LICENSE", &exts));
    }
}
