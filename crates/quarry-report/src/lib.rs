//! Tabular persistence: the repository schedule and per-repo result tables.
//!
//! The schedule is a CSV of repositories to mine, with a `computed` column
//! rewritten after each repository so an interrupted run resumes where it
//! stopped. Results are one CSV per repository, merged and re-sorted on
//! every incremental save, plus a combined `_all_results.csv` produced by
//! [`merge::merge_results`].

pub mod merge;
pub mod results;
pub mod schedule;

pub use merge::{merge_results, MergeSummary, MergedRecord};
pub use results::{CommitRecord, ResultsStore};
pub use schedule::{load_schedule, save_schedule, RepoEntry};
