//! Repository fetching and default-branch resolution.

use std::path::Path;

use git2::Repository;
use quarry_core::QuarryError;

/// Branch names tried, in order, when no explicit branch is configured.
const BRANCH_CANDIDATES: [&str; 4] = ["main", "master", "origin/main", "origin/master"];

/// Derive a repository's cache name from its URL.
///
/// The name is the last path segment with any `.git` suffix stripped. Both
/// `https://` and scp-style `git@host:owner/repo` URLs are accepted.
///
/// # Errors
///
/// Returns [`QuarryError::Git`] for an empty URL or one with no path segment.
///
/// # Examples
///
/// ```
/// use quarry_mine::fetch::repo_name_from_url;
///
/// let name = repo_name_from_url("https://github.com/psf/requests").unwrap();
/// assert_eq!(name, "requests");
///
/// let name = repo_name_from_url("git@github.com:psf/requests.git").unwrap();
/// assert_eq!(name, "requests");
/// ```
pub fn repo_name_from_url(url: &str) -> Result<String, QuarryError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(QuarryError::Git("repository URL is empty".into()));
    }

    let tail = trimmed
        .rsplit('/')
        .next()
        .map(|s| s.rsplit(':').next().unwrap_or(s))
        .unwrap_or_default();
    let name = tail.strip_suffix(".git").unwrap_or(tail);

    if name.is_empty() {
        return Err(QuarryError::Git(format!(
            "cannot derive a repository name from '{url}'"
        )));
    }
    Ok(name.to_string())
}

/// Open the cached clone at `cache_dir`, or clone `url` into it.
///
/// A cache directory that exists but is empty is treated as absent, so an
/// interrupted clone is retried rather than opened.
///
/// # Errors
///
/// Returns [`QuarryError::Git`] if neither opening nor cloning succeeds.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use quarry_mine::fetch::clone_or_open;
///
/// let repo = clone_or_open(
///     "https://github.com/psf/requests",
///     Path::new("data/repos/requests"),
/// )
/// .unwrap();
/// assert!(repo.path().exists());
/// ```
pub fn clone_or_open(url: &str, cache_dir: &Path) -> Result<Repository, QuarryError> {
    let populated = cache_dir.is_dir()
        && std::fs::read_dir(cache_dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);

    if populated {
        return Repository::open(cache_dir).map_err(|e| {
            QuarryError::Git(format!(
                "failed to open cached repository at {}: {e}",
                cache_dir.display()
            ))
        });
    }

    if let Some(parent) = cache_dir.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Repository::clone(url, cache_dir)
        .map_err(|e| QuarryError::Git(format!("failed to clone {url}: {e}")))
}

/// Resolve the branch whose history will be walked.
///
/// An explicit `override_branch` wins; otherwise the first of `main`,
/// `master`, `origin/main`, `origin/master` that resolves is used.
///
/// # Errors
///
/// Returns [`QuarryError::Git`] when the override does not resolve, or no
/// candidate does.
pub fn resolve_default_branch(
    repo: &Repository,
    override_branch: Option<&str>,
) -> Result<String, QuarryError> {
    if let Some(branch) = override_branch {
        return if repo.resolve_reference_from_short_name(branch).is_ok() {
            Ok(branch.to_string())
        } else {
            Err(QuarryError::Git(format!(
                "configured branch '{branch}' does not exist"
            )))
        };
    }

    for candidate in BRANCH_CANDIDATES {
        if repo.resolve_reference_from_short_name(candidate).is_ok() {
            return Ok(candidate.to_string());
        }
    }

    Err(QuarryError::Git(format!(
        "no default branch found (tried {})",
        BRANCH_CANDIDATES.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_from_https_url() {
        assert_eq!(
            repo_name_from_url("https://github.com/psf/requests").unwrap(),
            "requests"
        );
    }

    #[test]
    fn name_strips_git_suffix_and_trailing_slash() {
        assert_eq!(
            repo_name_from_url("https://github.com/psf/requests.git/").unwrap(),
            "requests"
        );
    }

    #[test]
    fn name_from_scp_style_url() {
        assert_eq!(
            repo_name_from_url("git@github.com:psf/requests.git").unwrap(),
            "requests"
        );
    }

    #[test]
    fn name_from_bare_host_colon_url() {
        assert_eq!(
            repo_name_from_url("git@github.com:requests").unwrap(),
            "requests"
        );
    }

    #[test]
    fn empty_url_is_an_error() {
        assert!(repo_name_from_url("").is_err());
        assert!(repo_name_from_url("   ").is_err());
    }

    #[test]
    fn only_suffix_is_an_error() {
        assert!(repo_name_from_url("https://github.com/psf/.git").is_err());
    }
}
