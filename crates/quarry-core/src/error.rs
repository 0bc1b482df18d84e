use std::path::PathBuf;

/// Errors that can occur across the Quarry miner.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use quarry_core::QuarryError;
///
/// let err = QuarryError::Config("missing data directory".into());
/// assert!(err.to_string().contains("missing data directory"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum QuarryError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Source code parsing failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// CSV read or write failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: QuarryError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn git_error_displays_message() {
        let err = QuarryError::Git("branch not found".into());
        assert_eq!(err.to_string(), "git error: branch not found");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = QuarryError::FileNotFound(PathBuf::from("/tmp/urls.csv"));
        assert!(err.to_string().contains("/tmp/urls.csv"));
    }
}
