use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use quarry_core::{OutputFormat, QuarryConfig};
use quarry_mine::walk::{shorten_message, walk_history, CommitInfo, WalkOptions};
use quarry_mine::{fetch, snapshot};
use quarry_report::{
    load_schedule, merge_results, save_schedule, CommitRecord, ResultsStore,
};

#[derive(Parser)]
#[command(
    name = "quarry",
    version,
    about = "Per-commit software metrics miner for git repositories",
    long_about = "Quarry mines software metrics from git history: it walks every commit of a\n\
                   repository's default branch and records change statistics alongside static\n\
                   source metrics (LOC, cyclomatic complexity, Halstead, maintainability).\n\n\
                   Examples:\n  \
                     quarry run --urls-path data/url/urls.csv   Mine every repository in a schedule\n  \
                     quarry analyze .                           Mine the repository in the current directory\n  \
                     quarry analyze https://github.com/psf/requests --save\n  \
                     quarry merge                               Combine all result tables into one\n  \
                     quarry doctor                              Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .quarry.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable summaries (default)\n  \
                         json  Machine-readable JSON"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Mine metrics for every repository listed in a schedule CSV
    #[command(
        long_about = "Mine metrics for every repository listed in a schedule CSV.\n\n\
        The schedule has columns `name`, `repo_url`, and `computed`. Repositories are\n\
        cloned into the data directory, their default branch walked newest-first, and\n\
        per-commit metrics appended to data/results/<name>.csv. The schedule's\n\
        `computed` column is rewritten after each repository, so an interrupted run\n\
        resumes where it stopped. A failing repository is logged and skipped.\n\n\
        Examples:\n  quarry run --urls-path data/url/urls.csv\n  quarry run --urls-path urls.csv --limit 5"
    )]
    Run {
        /// Path to the schedule CSV with repository names and urls
        #[arg(long)]
        urls_path: PathBuf,

        /// Process at most this many repositories
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Mine metrics for a single repository by path or URL
    #[command(
        long_about = "Mine metrics for a single repository.\n\n\
        Accepts a local path or a clone URL. Without --save the per-commit records are\n\
        summarized (text) or printed in full (json); with --save they are written to\n\
        the results directory like a `run` would.\n\n\
        Examples:\n  quarry analyze .\n  quarry analyze https://github.com/psf/requests --save"
    )]
    Analyze {
        /// Repository path or clone URL
        repo: String,

        /// Write results to the results directory instead of printing
        #[arg(long)]
        save: bool,
    },
    /// Combine all per-repository result tables into _all_results.csv
    #[command(
        long_about = "Combine all per-repository result tables into _all_results.csv.\n\n\
        Rows are tagged with their repository name, duplicate commit hashes dropped,\n\
        and the combined table sorted by commit date.\n\n\
        Example:\n  quarry merge"
    )]
    Merge,
    /// Create a default .quarry.toml configuration file
    #[command(long_about = "Create a default .quarry.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .quarry.toml already exists.")]
    Init,
    /// Check your Quarry setup and environment
    #[command(long_about = "Check your Quarry setup and environment.\n\n\
        Runs diagnostics for the config file, data directory, repository cache,\n\
        result tables, and schedule file. Use --format json for machine-readable\n\
        output.")]
    Doctor {
        /// Schedule CSV to validate
        #[arg(long)]
        urls_path: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m⛏\x1b[0m \x1b[1mquarry\x1b[0m v{version} — per-commit software metrics miner\n");

        println!("Quick start:");
        println!("  \x1b[36mquarry init\x1b[0m                          Create a .quarry.toml config file");
        println!("  \x1b[36mquarry run --urls-path urls.csv\x1b[0m      Mine every repository in a schedule");
        println!("  \x1b[36mquarry analyze .\x1b[0m                     Mine the current repository\n");

        println!("All commands:");
        println!("  \x1b[32mrun\x1b[0m      Mine every repository in a schedule CSV");
        println!("  \x1b[32manalyze\x1b[0m  Mine a single repository by path or URL");
        println!("  \x1b[32mmerge\x1b[0m    Combine result tables into _all_results.csv");
        println!("  \x1b[32mdoctor\x1b[0m   Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m     Create default configuration\n");
    } else {
        println!("quarry v{version} — per-commit software metrics miner\n");

        println!("Quick start:");
        println!("  quarry init                          Create a .quarry.toml config file");
        println!("  quarry run --urls-path urls.csv      Mine every repository in a schedule");
        println!("  quarry analyze .                     Mine the current repository\n");

        println!("All commands:");
        println!("  run      Mine every repository in a schedule CSV");
        println!("  analyze  Mine a single repository by path or URL");
        println!("  merge    Combine result tables into _all_results.csv");
        println!("  doctor   Check your setup and environment");
        println!("  init     Create default configuration\n");
    }

    println!("Run 'quarry <command> --help' for details.");
}

fn init_logging(verbose: bool, level: &str, log_file: &Path) {
    let directive = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_env("QUARRY_LOG")
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = open_log_file(log_file).map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Arc::new(file))
            .with_ansi(false)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
}

fn open_log_file(path: &Path) -> Option<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).ok()?;
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()
}

fn commit_date(timestamp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Compute the results row for one commit.
fn compute_record(
    repo: &git2::Repository,
    commit: &CommitInfo,
    extensions: &[String],
    max_file_kb: u64,
) -> Result<CommitRecord, quarry_core::QuarryError> {
    let files = snapshot::snapshot_at(repo, &commit.hash, extensions, max_file_kb)?;
    let metrics = quarry_metrics::analyze_snapshot(
        files.iter().map(|f| (f.path.as_path(), f.content.as_str())),
    );

    Ok(CommitRecord {
        id: 0,
        hash: commit.hash.clone(),
        author: commit.author.clone(),
        date: commit_date(commit.timestamp),
        message: commit.message.clone(),
        is_merge: commit.is_merge,
        lines_changed: commit.lines_changed(),
        insertions: commit.insertions,
        deletions: commit.deletions,
        loc: metrics.loc,
        lloc: metrics.lloc,
        sloc: metrics.sloc,
        comments: metrics.comments,
        avg_complexity: metrics.avg_complexity,
        avg_mi: metrics.avg_mi,
        avg_vocabulary: metrics.avg_vocabulary,
        avg_length: metrics.avg_length,
        avg_volume: metrics.avg_volume,
        avg_difficulty: metrics.avg_difficulty,
        avg_effort: metrics.avg_effort,
        avg_time: metrics.avg_time,
        avg_bugs: metrics.avg_bugs,
    })
}

fn progress_bar(total: u64, show: bool) -> indicatif::ProgressBar {
    if !show {
        return indicatif::ProgressBar::hidden();
    }
    let pb = indicatif::ProgressBar::new(total);
    pb.set_style(
        indicatif::ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} {msg} ({elapsed})",
        )
        .unwrap()
        .progress_chars("##-"),
    );
    pb
}

/// Mine one repository and append its records to the results store.
///
/// Returns the number of rows in the repository's table afterwards.
fn process_repository(
    config: &QuarryConfig,
    store: &ResultsStore,
    name: &str,
    url: &str,
    show_progress: bool,
) -> Result<usize, quarry_core::QuarryError> {
    let cache_dir = config.repos_dir().join(name);
    info!("fetching {url} into {}", cache_dir.display());
    let repo = fetch::clone_or_open(url, &cache_dir)?;

    mine_repository(config, store, name, &repo, show_progress)
}

/// Walk an opened repository and append its records to the results store.
fn mine_repository(
    config: &QuarryConfig,
    store: &ResultsStore,
    name: &str,
    repo: &git2::Repository,
    show_progress: bool,
) -> Result<usize, quarry_core::QuarryError> {
    let branch = fetch::resolve_default_branch(repo, config.mining.branch.as_deref())?;
    let extensions = quarry_metrics::extensions_for(&config.mining.languages);
    let skip_hashes = store.known_hashes(name)?;
    let already_known = skip_hashes.len();

    let options = WalkOptions {
        branch: Some(branch.clone()),
        extensions: extensions.clone(),
        skip_hashes,
    };
    let commits = walk_history(repo, &options)?;
    info!(
        "{name}: {} commits to process on '{branch}' ({already_known} already recorded)",
        commits.len()
    );

    if commits.is_empty() {
        if already_known == 0 {
            warn!("found zero computable commits for {name}");
        }
        return Ok(already_known);
    }

    let progress = progress_bar(commits.len() as u64, show_progress);
    progress.set_message(name.to_string());

    let total = commits.len();
    let mut pending: Vec<CommitRecord> = Vec::new();
    let mut written = already_known;

    for (i, commit) in commits.iter().enumerate() {
        let started = std::time::Instant::now();
        let record = compute_record(repo, commit, &extensions, config.mining.max_file_kb)?;

        debug!(
            "repo {name} | commit {} of {total} | author: {} | date: {} | lines_changed: {} (+{} -{}) | time: {:.2}s | message: {}",
            i + 1,
            commit.author,
            record.date,
            commit.lines_changed(),
            commit.insertions,
            commit.deletions,
            started.elapsed().as_secs_f64(),
            shorten_message(&commit.message, 100),
        );

        pending.push(record);
        progress.inc(1);

        if pending.len() >= config.mining.save_every {
            written = store.save(name, std::mem::take(&mut pending))?;
        }
    }

    if !pending.is_empty() {
        written = store.save(name, std::mem::take(&mut pending))?;
    }
    progress.finish_and_clear();

    Ok(written)
}

fn run_schedule(
    config: &QuarryConfig,
    urls_path: &Path,
    limit: Option<usize>,
    show_progress: bool,
) -> Result<()> {
    let mut entries = load_schedule(urls_path)
        .into_diagnostic()
        .wrap_err(format!("reading schedule {}", urls_path.display()))?;

    if entries.is_empty() {
        miette::bail!(miette::miette!(
            help = "The schedule needs columns `name` and `repo_url` with one repository per row",
            "Schedule {} contains no repositories",
            urls_path.display()
        ));
    }

    let store = ResultsStore::new(config.results_dir());
    let mut attempted = 0usize;
    let mut failed = 0usize;

    for i in 0..entries.len() {
        if entries[i].computed {
            continue;
        }
        if let Some(max) = limit {
            if attempted >= max {
                break;
            }
        }
        attempted += 1;

        let url = entries[i].repo_url.trim().to_string();
        if url.is_empty() {
            warn!("entry '{}' has no repo_url, skipping", entries[i].name);
            entries[i].computed = true;
            save_schedule(urls_path, &entries).into_diagnostic()?;
            continue;
        }

        let name = if entries[i].name.trim().is_empty() {
            match fetch::repo_name_from_url(&url) {
                Ok(name) => name,
                Err(e) => {
                    warn!("cannot derive a name for '{url}': {e}");
                    failed += 1;
                    continue;
                }
            }
        } else {
            entries[i].name.trim().to_string()
        };

        match process_repository(config, &store, &name, &url, show_progress) {
            Ok(rows) => {
                info!("{name}: {rows} rows in {}", store.path_for(&name).display());
                entries[i].computed = true;
                save_schedule(urls_path, &entries).into_diagnostic()?;
            }
            Err(e) => {
                failed += 1;
                tracing::error!("{name}: {e}");
            }
        }
    }

    if attempted == 0 {
        println!("Nothing to do: every schedule entry is already computed.");
        return Ok(());
    }
    if failed == attempted {
        miette::bail!("all {attempted} attempted repositories failed");
    }

    println!(
        "Processed {} repositories ({failed} failed).",
        attempted - failed
    );
    Ok(())
}

fn analyze_repository(
    config: &QuarryConfig,
    target: &str,
    save: bool,
    format: OutputFormat,
    show_progress: bool,
) -> Result<()> {
    let local = Path::new(target);
    let (name, repo) = if local.is_dir() {
        let repo = git2::Repository::discover(local)
            .into_diagnostic()
            .wrap_err(format!("opening repository at {target}"))?;
        let name = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .components()
            .filter_map(|c| match c {
                std::path::Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .filter(|part| *part != ".git")
            .next_back()
            .unwrap_or("repository")
            .to_string();
        (name, repo)
    } else {
        let name = fetch::repo_name_from_url(target).into_diagnostic()?;
        let cache_dir = config.repos_dir().join(&name);
        let repo = fetch::clone_or_open(target, &cache_dir).into_diagnostic()?;
        (name, repo)
    };

    if save {
        let store = ResultsStore::new(config.results_dir());
        let rows =
            mine_repository(config, &store, &name, &repo, show_progress).into_diagnostic()?;
        println!("{name}: {rows} rows in {}", store.path_for(&name).display());
        return Ok(());
    }

    // In-memory analysis: same pipeline, nothing written.
    let branch =
        fetch::resolve_default_branch(&repo, config.mining.branch.as_deref()).into_diagnostic()?;
    let extensions = quarry_metrics::extensions_for(&config.mining.languages);
    let options = WalkOptions {
        branch: Some(branch),
        extensions: extensions.clone(),
        skip_hashes: Default::default(),
    };
    let commits = walk_history(&repo, &options).into_diagnostic()?;

    let progress = progress_bar(commits.len() as u64, show_progress);
    progress.set_message(name.clone());
    let mut records = Vec::with_capacity(commits.len());
    for commit in &commits {
        let record = compute_record(&repo, commit, &extensions, config.mining.max_file_kb)
            .into_diagnostic()?;
        records.push(record);
        progress.inc(1);
    }
    progress.finish_and_clear();
    records.sort_by_key(|r| r.date);
    for (index, record) in records.iter_mut().enumerate() {
        record.id = index as u64;
    }

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&records).into_diagnostic()?
            );
        }
        OutputFormat::Text => {
            print_analysis_summary(&name, &records);
        }
    }
    Ok(())
}

fn print_analysis_summary(name: &str, records: &[CommitRecord]) {
    println!("Repository: {name}");
    println!("Commits analyzed: {}", records.len());
    if records.is_empty() {
        return;
    }

    let first = &records[0];
    let last = &records[records.len() - 1];
    println!("Date range: {} .. {}", first.date, last.date);

    let insertions: u64 = records.iter().map(|r| r.insertions).sum();
    let deletions: u64 = records.iter().map(|r| r.deletions).sum();
    let merges = records.iter().filter(|r| r.is_merge).count();
    println!("Lines changed: +{insertions} -{deletions} ({merges} merges)");
    println!(
        "Latest snapshot: loc={} sloc={} lloc={} comments={}",
        last.loc, last.sloc, last.lloc, last.comments
    );

    let avg = |values: Vec<f64>| -> Option<f64> {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };
    let complexity = avg(records.iter().filter_map(|r| r.avg_complexity).collect());
    let mi = avg(records.iter().filter_map(|r| r.avg_mi).collect());
    if let Some(c) = complexity {
        println!("Mean cyclomatic complexity: {c:.2}");
    }
    if let Some(m) = mi {
        println!("Mean maintainability index: {m:.1}");
    }
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(
    config: &QuarryConfig,
    urls_path: Option<&Path>,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. Config file
    let config_path = Path::new(".quarry.toml");
    if config_path.exists() {
        checks.push(CheckResult::pass(
            "config_file",
            format!(
                ".quarry.toml found (languages: {})",
                config.mining.languages.join(", ")
            ),
        ));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            ".quarry.toml not found",
            "run 'quarry init' to create a default config",
        ));
    }

    // 2. Data directory
    let data_dir = &config.storage.data_dir;
    match std::fs::create_dir_all(data_dir) {
        Ok(()) => checks.push(CheckResult::pass(
            "data_dir",
            format!("writable at {}", data_dir.display()),
        )),
        Err(e) => checks.push(CheckResult::fail(
            "data_dir",
            format!("cannot create {}: {e}", data_dir.display()),
            "set [storage] data_dir in .quarry.toml to a writable location",
        )),
    }

    // 3. Repository cache
    let repos_dir = config.repos_dir();
    let cached = std::fs::read_dir(&repos_dir)
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0);
    checks.push(CheckResult::info(
        "repos_cache",
        format!("{cached} cached repositories"),
    ));

    // 4. Result tables
    let results_dir = config.results_dir();
    let tables = std::fs::read_dir(&results_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("csv"))
                .count()
        })
        .unwrap_or(0);
    if tables > 0 {
        checks.push(CheckResult::pass(
            "results",
            format!("{tables} result tables in {}", results_dir.display()),
        ));
    } else {
        checks.push(CheckResult::info(
            "results",
            "no result tables yet (run 'quarry run' or 'quarry analyze --save')",
        ));
    }

    // 5. Schedule file
    match urls_path {
        Some(path) => match load_schedule(path) {
            Ok(entries) => {
                let computed = entries.iter().filter(|e| e.computed).count();
                checks.push(CheckResult::pass(
                    "schedule",
                    format!("{} repositories ({computed} computed)", entries.len()),
                ));
            }
            Err(e) => checks.push(CheckResult::fail(
                "schedule",
                format!("{}: {e}", path.display()),
                "the schedule needs a header row with `name` and `repo_url` columns",
            )),
        },
        None => checks.push(CheckResult::info(
            "schedule",
            "not checked (pass --urls-path to validate one)",
        )),
    }

    // 6. Log file
    let log_file = config.log_file();
    match open_log_file(&log_file) {
        Some(_) => checks.push(CheckResult::pass(
            "log_file",
            format!("writable at {}", log_file.display()),
        )),
        None => checks.push(CheckResult::fail(
            "log_file",
            format!("cannot open {}", log_file.display()),
            "set [log] file in .quarry.toml to a writable location",
        )),
    }

    // Output
    match format {
        OutputFormat::Json => {
            let version = env!("CARGO_PKG_VERSION");
            let json = serde_json::json!({
                "version": version,
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Text => {
            let version = env!("CARGO_PKG_VERSION");
            println!("Quarry v{version} — Environment Check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<14} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Quarry Configuration
# See: https://github.com/quarry-dev/quarry

[storage]
# Root directory for repository caches, results, and logs
# data_dir = "data"

[mining]
# Branch to walk; resolved from main/master when unset
# branch = "main"
# Languages whose files are analyzed
# languages = ["python"]
# Write results to disk every N processed commits
# save_every = 100
# Skip snapshot files larger than this many KiB
# max_file_kb = 1024

[log]
# file = "data/quarry.log"
# level = "info"
"#;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => QuarryConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = Path::new(".quarry.toml");
            if default_path.exists() {
                QuarryConfig::from_file(default_path).into_diagnostic()?
            } else {
                QuarryConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };
    let show_progress = std::io::stderr().is_terminal();

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Run {
            ref urls_path,
            limit,
        }) => {
            init_logging(cli.verbose, &config.log.level, &config.log_file());
            if !urls_path.exists() {
                miette::bail!(miette::miette!(
                    help = "Provide a CSV with `name` and `repo_url` columns, e.g.:\n       name,repo_url\n       requests,https://github.com/psf/requests",
                    "Schedule file not found: {}",
                    urls_path.display()
                ));
            }
            run_schedule(&config, urls_path, limit, show_progress)?;
        }
        Some(Command::Analyze { ref repo, save }) => {
            init_logging(cli.verbose, &config.log.level, &config.log_file());
            analyze_repository(&config, repo, save, cli.format, show_progress)?;
        }
        Some(Command::Merge) => {
            init_logging(cli.verbose, &config.log.level, &config.log_file());
            let results_dir = config.results_dir();
            if !results_dir.exists() {
                miette::bail!(miette::miette!(
                    help = "Run 'quarry run' or 'quarry analyze --save' first to produce result tables",
                    "Results directory not found: {}",
                    results_dir.display()
                ));
            }
            let summary = merge_results(&results_dir).into_diagnostic()?;
            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&summary).into_diagnostic()?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "Merged {} tables: {} rows written, {} duplicates dropped.",
                        summary.files_merged, summary.rows_written, summary.duplicates_dropped
                    );
                }
            }
        }
        Some(Command::Init) => {
            let path = Path::new(".quarry.toml");
            if path.exists() {
                miette::bail!(".quarry.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .quarry.toml with default configuration");
        }
        Some(Command::Doctor { ref urls_path }) => {
            run_doctor(&config, urls_path.as_deref(), cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "quarry", &mut std::io::stdout());
        }
    }

    Ok(())
}
