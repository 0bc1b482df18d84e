//! Git repository access: fetching, history walking, and tree snapshots.
//!
//! Clones or opens repositories into a local cache, resolves the default
//! branch, walks commit history newest-first with per-commit change counts,
//! and materializes the source files of any commit's tree in memory without
//! touching the working tree.

pub mod fetch;
pub mod snapshot;
pub mod walk;
