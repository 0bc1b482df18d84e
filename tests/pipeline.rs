//! End-to-end tests driving the quarry binary against local repositories.

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{Repository, RepositoryInitOptions, Signature, Time};
use tempfile::TempDir;

/// Build a small git repository with a few Python commits.
struct SourceRepo {
    _dir: TempDir,
    path: PathBuf,
    repo: Repository,
    commits: Vec<git2::Oid>,
    clock: i64,
}

impl SourceRepo {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let mut init_opts = RepositoryInitOptions::new();
        init_opts.initial_head("main");
        let repo = Repository::init_opts(&path, &init_opts).unwrap();

        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        SourceRepo {
            _dir: dir,
            path,
            repo,
            commits: Vec::new(),
            clock: 1_600_000_000,
        }
    }

    fn add_commit(&mut self, message: &str, files: &[(&str, &str)]) -> git2::Oid {
        for (name, content) in files {
            std::fs::write(self.path.join(name), content).unwrap();
        }

        let mut index = self.repo.index().unwrap();
        for (name, _) in files {
            index.add_path(Path::new(name)).unwrap();
        }
        index.write().unwrap();

        self.clock += 3600;
        let signature =
            Signature::new("Test User", "test@example.com", &Time::new(self.clock, 0)).unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let parent_commit = self
            .commits
            .last()
            .map(|oid| self.repo.find_commit(*oid).unwrap());
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap();
        self.commits.push(oid);
        oid
    }
}

fn sample_source() -> SourceRepo {
    let mut source = SourceRepo::new();
    source.add_commit(
        "initial",
        &[("app.py", "def greet(name):\n    return f\"hi {name}\"\n")],
    );
    source.add_commit(
        "add pick",
        &[(
            "app.py",
            "def greet(name):\n    return f\"hi {name}\"\n\ndef pick(x):\n    if x:\n        return 1\n    return 2\n",
        )],
    );
    source.add_commit("docs only", &[("README.md", "# demo\n")]);
    source
}

fn quarry() -> Command {
    Command::new(env!("CARGO_BIN_EXE_quarry"))
}

#[test]
fn run_mines_schedule_and_marks_computed() {
    let source = sample_source();
    let workdir = tempfile::tempdir().unwrap();

    let urls_path = workdir.path().join("urls.csv");
    std::fs::write(
        &urls_path,
        format!("name,repo_url\ndemo,{}\n", source.path.display()),
    )
    .unwrap();

    let output = quarry()
        .args(["run", "--urls-path", "urls.csv"])
        .current_dir(workdir.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "quarry run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // Results table exists with one row per Python-touching commit.
    let store = quarry_report::ResultsStore::new(workdir.path().join("data/results"));
    let records = store.load("demo").unwrap();
    assert_eq!(records.len(), 2, "docs-only commit must be excluded");
    assert_eq!(records[0].message, "initial");
    assert_eq!(records[0].id, 0);
    assert!(records[0].date < records[1].date);
    assert_eq!(records[1].loc, 7, "snapshot covers the full app.py");
    assert!(records[1].avg_complexity.is_some());

    // The schedule is rewritten with computed=true.
    let entries = quarry_report::load_schedule(&urls_path).unwrap();
    assert!(entries[0].computed);

    // A second run has nothing to do and succeeds.
    let output = quarry()
        .args(["run", "--urls-path", "urls.csv"])
        .current_dir(workdir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Nothing to do"), "stdout: {stdout}");
}

#[test]
fn run_resumes_after_partial_results() {
    let source = sample_source();
    let workdir = tempfile::tempdir().unwrap();

    let urls_path = workdir.path().join("urls.csv");
    std::fs::write(
        &urls_path,
        format!("name,repo_url\ndemo,{}\n", source.path.display()),
    )
    .unwrap();

    // First full run.
    let output = quarry()
        .args(["run", "--urls-path", "urls.csv"])
        .current_dir(workdir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    // Un-mark the entry: the rerun must skip already-recorded hashes and
    // leave the table unchanged.
    std::fs::write(
        &urls_path,
        format!("name,repo_url,computed\ndemo,{},false\n", source.path.display()),
    )
    .unwrap();
    let output = quarry()
        .args(["run", "--urls-path", "urls.csv"])
        .current_dir(workdir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let store = quarry_report::ResultsStore::new(workdir.path().join("data/results"));
    let records = store.load("demo").unwrap();
    assert_eq!(records.len(), 2, "resume must not duplicate rows");
}

#[test]
fn merge_combines_result_tables() {
    let source = sample_source();
    let workdir = tempfile::tempdir().unwrap();

    let urls_path = workdir.path().join("urls.csv");
    std::fs::write(
        &urls_path,
        format!("name,repo_url\ndemo,{}\n", source.path.display()),
    )
    .unwrap();

    quarry()
        .args(["run", "--urls-path", "urls.csv"])
        .current_dir(workdir.path())
        .output()
        .unwrap();

    let output = quarry()
        .arg("merge")
        .current_dir(workdir.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "quarry merge failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let combined = workdir.path().join("data/results/_all_results.csv");
    assert!(combined.exists());
    let content = std::fs::read_to_string(&combined).unwrap();
    assert!(content.contains("repo_name"));
    assert!(content.contains("demo"));
}

#[test]
fn analyze_prints_json_records() {
    let source = sample_source();
    let workdir = tempfile::tempdir().unwrap();

    let output = quarry()
        .arg("analyze")
        .arg(source.path.as_os_str())
        .args(["--format", "json"])
        .current_dir(workdir.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "quarry analyze failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let records: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let array = records.as_array().unwrap();
    assert_eq!(array.len(), 2);
    assert_eq!(array[0]["message"], "initial");
    assert!(array[1]["loc"].as_u64().unwrap() > 0);
}

#[test]
fn run_reports_missing_schedule() {
    let workdir = tempfile::tempdir().unwrap();
    let output = quarry()
        .args(["run", "--urls-path", "missing.csv"])
        .current_dir(workdir.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.csv"), "stderr: {stderr}");
}

#[test]
fn doctor_reports_checks_in_json() {
    let workdir = tempfile::tempdir().unwrap();
    let output = quarry()
        .args(["doctor", "--format", "json"])
        .current_dir(workdir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let checks = report["checks"].as_array().unwrap();
    assert!(checks.iter().any(|c| c["name"] == "config_file"));
    assert!(checks.iter().any(|c| c["name"] == "data_dir"));
}
