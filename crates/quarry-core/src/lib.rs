//! Core types, configuration, and error handling for the Quarry miner.
//!
//! This crate provides the shared foundation used by all other Quarry crates:
//! - [`QuarryError`] — unified error type using `thiserror`
//! - [`QuarryConfig`] — configuration loaded from `.quarry.toml`
//! - [`OutputFormat`] — output selection shared by CLI subcommands

mod config;
mod error;
mod types;

pub use config::{LogConfig, MiningConfig, QuarryConfig, StorageConfig};
pub use error::QuarryError;
pub use types::OutputFormat;

/// A convenience `Result` type for Quarry operations.
pub type Result<T> = std::result::Result<T, QuarryError>;
