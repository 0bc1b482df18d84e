//! Commit history extraction via git2.
//!
//! Walks a branch's history newest-first, extracting per-commit change
//! counts, author info, timestamps, and the merge flag.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use git2::{Delta, DiffOptions, Repository, Sort};
use quarry_core::QuarryError;

/// Raw commit data extracted from git history.
///
/// # Examples
///
/// ```
/// use quarry_mine::walk::CommitInfo;
///
/// let info = CommitInfo {
///     hash: "4f2a9c1d".repeat(5),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     timestamp: 1700000000,
///     message: "fix: flaky retry loop".into(),
///     is_merge: false,
///     insertions: 12,
///     deletions: 4,
///     files_changed: vec![],
/// };
/// assert_eq!(info.lines_changed(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// Full hex commit hash.
    pub hash: String,
    /// Author name.
    pub author: String,
    /// Author email.
    pub email: String,
    /// Unix timestamp of the commit.
    pub timestamp: i64,
    /// Full commit message.
    pub message: String,
    /// Whether the commit has more than one parent.
    pub is_merge: bool,
    /// Lines added across all files, against the first parent.
    pub insertions: u64,
    /// Lines deleted across all files, against the first parent.
    pub deletions: u64,
    /// Files modified in this commit.
    pub files_changed: Vec<FileChange>,
}

impl CommitInfo {
    /// Total lines touched: insertions plus deletions.
    pub fn lines_changed(&self) -> u64 {
        self.insertions + self.deletions
    }
}

/// A single file change within a commit.
///
/// # Examples
///
/// ```
/// use quarry_mine::walk::{ChangeStatus, FileChange};
///
/// let change = FileChange {
///     path: "src/session.py".into(),
///     lines_added: 10,
///     lines_deleted: 3,
///     status: ChangeStatus::Modified,
/// };
/// assert_eq!(change.lines_added, 10);
/// ```
#[derive(Debug, Clone)]
pub struct FileChange {
    /// File path relative to repo root.
    pub path: String,
    /// Lines added in this commit.
    pub lines_added: u64,
    /// Lines deleted in this commit.
    pub lines_deleted: u64,
    /// Type of change.
    pub status: ChangeStatus,
}

/// Status of a file change within a commit.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeStatus {
    /// New file.
    Added,
    /// Existing file modified.
    Modified,
    /// File removed.
    Deleted,
    /// File renamed from another path.
    Renamed {
        /// Original path before rename.
        from: String,
    },
}

/// Options for history walking.
///
/// # Examples
///
/// ```
/// use quarry_mine::walk::WalkOptions;
///
/// let opts = WalkOptions::default();
/// assert!(opts.branch.is_none());
/// assert!(opts.extensions.is_empty());
/// assert!(opts.skip_hashes.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct WalkOptions {
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
    /// When non-empty, skip commits touching no file with one of these
    /// extensions (without the dot).
    pub extensions: Vec<String>,
    /// Commit hashes to skip, used to resume an interrupted run.
    pub skip_hashes: HashSet<String>,
}

/// Walk commit history from the branch tip, newest first.
///
/// Each commit is diffed against its first parent (the empty tree for root
/// commits) with rename detection enabled. Merge commits are included and
/// flagged. Commits listed in [`WalkOptions::skip_hashes`], and commits
/// touching no file matching [`WalkOptions::extensions`], are skipped.
///
/// # Errors
///
/// Returns [`QuarryError::Git`] if the branch cannot be resolved or the
/// history cannot be walked.
///
/// # Examples
///
/// ```no_run
/// use git2::Repository;
/// use quarry_mine::walk::{walk_history, WalkOptions};
///
/// let repo = Repository::open(".").unwrap();
/// let commits = walk_history(&repo, &WalkOptions::default()).unwrap();
/// for c in &commits {
///     println!("{}: +{} -{}", &c.hash[..7], c.insertions, c.deletions);
/// }
/// ```
pub fn walk_history(
    repo: &Repository,
    options: &WalkOptions,
) -> Result<Vec<CommitInfo>, QuarryError> {
    let mut revwalk = repo
        .revwalk()
        .map_err(|e| QuarryError::Git(format!("failed to create revwalk: {e}")))?;

    revwalk.set_sorting(Sort::TIME).ok();

    if let Some(ref branch) = options.branch {
        let reference = repo
            .resolve_reference_from_short_name(branch)
            .map_err(|e| QuarryError::Git(format!("failed to resolve branch '{branch}': {e}")))?;
        let oid = reference
            .target()
            .ok_or_else(|| QuarryError::Git(format!("branch '{branch}' has no target")))?;
        revwalk
            .push(oid)
            .map_err(|e| QuarryError::Git(format!("failed to push oid: {e}")))?;
    } else {
        revwalk
            .push_head()
            .map_err(|e| QuarryError::Git(format!("failed to push HEAD: {e}")))?;
    }

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| QuarryError::Git(format!("revwalk error: {e}")))?;
        let hash = oid.to_string();

        if options.skip_hashes.contains(&hash) {
            continue;
        }

        let commit = repo
            .find_commit(oid)
            .map_err(|e| QuarryError::Git(format!("failed to find commit: {e}")))?;

        let files_changed = extract_file_changes(repo, &commit)?;

        if !options.extensions.is_empty()
            && !files_changed
                .iter()
                .any(|f| matches_extension(&f.path, &options.extensions))
        {
            continue;
        }

        let insertions = files_changed.iter().map(|f| f.lines_added).sum();
        let deletions = files_changed.iter().map(|f| f.lines_deleted).sum();

        let author = commit.author();
        commits.push(CommitInfo {
            hash,
            author: author.name().unwrap_or("unknown").to_string(),
            email: author.email().unwrap_or("unknown").to_string(),
            timestamp: commit.time().seconds(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            is_merge: commit.parent_count() > 1,
            insertions,
            deletions,
            files_changed,
        });
    }

    Ok(commits)
}

/// Flatten a commit message to one line of at most `max_len` characters.
///
/// # Examples
///
/// ```
/// use quarry_mine::walk::shorten_message;
///
/// assert_eq!(shorten_message("fix: bug\n\ndetails", 80), "fix: bug  details");
/// assert_eq!(shorten_message("abcdef", 3), "abc...");
/// ```
pub fn shorten_message(message: &str, max_len: usize) -> String {
    let flat: String = message
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_len {
        return flat;
    }
    let mut short: String = flat.chars().take(max_len).collect();
    short.push_str("...");
    short
}

fn matches_extension(path: &str, extensions: &[String]) -> bool {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

fn extract_file_changes(
    repo: &Repository,
    commit: &git2::Commit,
) -> Result<Vec<FileChange>, QuarryError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| QuarryError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| QuarryError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| QuarryError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| QuarryError::Git(format!("failed to compute diff: {e}")))?;

    let mut find_opts = git2::DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(|e| QuarryError::Git(format!("failed to find renames: {e}")))?;

    // Per-file added/deleted line counts, keyed by path.
    let mut line_counts: HashMap<String, (u64, u64)> = HashMap::new();
    diff.foreach(
        &mut |_delta, _progress| true,
        None,
        None,
        Some(&mut |delta, _hunk, line| {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .unwrap_or(Path::new(""))
                .to_string_lossy()
                .to_string();

            let entry = line_counts.entry(path).or_insert((0, 0));
            match line.origin() {
                '+' => entry.0 += 1,
                '-' => entry.1 += 1,
                _ => {}
            }
            true
        }),
    )
    .map_err(|e| QuarryError::Git(format!("failed to iterate diff lines: {e}")))?;

    let mut changes = Vec::new();
    for delta_idx in 0..diff.deltas().len() {
        let Some(delta) = diff.get_delta(delta_idx) else {
            continue;
        };

        let (path, status) = match delta.status() {
            Delta::Deleted => {
                let old_path = delta
                    .old_file()
                    .path()
                    .unwrap_or(Path::new(""))
                    .to_string_lossy()
                    .to_string();
                (old_path, ChangeStatus::Deleted)
            }
            Delta::Added => (new_path(&delta), ChangeStatus::Added),
            Delta::Renamed => {
                let from = delta
                    .old_file()
                    .path()
                    .unwrap_or(Path::new(""))
                    .to_string_lossy()
                    .to_string();
                (new_path(&delta), ChangeStatus::Renamed { from })
            }
            _ => (new_path(&delta), ChangeStatus::Modified),
        };

        if path.is_empty() {
            continue;
        }

        let (lines_added, lines_deleted) = line_counts.get(&path).copied().unwrap_or((0, 0));
        changes.push(FileChange {
            path,
            lines_added,
            lines_deleted,
            status,
        });
    }

    Ok(changes)
}

fn new_path(delta: &git2::DiffDelta<'_>) -> String {
    delta
        .new_file()
        .path()
        .unwrap_or(Path::new(""))
        .to_string_lossy()
        .to_string()
}
