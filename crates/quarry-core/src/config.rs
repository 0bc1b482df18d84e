use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::QuarryError;

/// Top-level configuration loaded from `.quarry.toml`.
///
/// Every section is optional: an empty file yields a fully usable default
/// configuration.
///
/// # Examples
///
/// ```
/// use quarry_core::QuarryConfig;
///
/// let config = QuarryConfig::default();
/// assert_eq!(config.mining.save_every, 100);
/// assert_eq!(config.storage.data_dir.to_str(), Some("data"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuarryConfig {
    /// Where repositories and results live on disk.
    #[serde(default)]
    pub storage: StorageConfig,
    /// History walking and metric computation settings.
    #[serde(default)]
    pub mining: MiningConfig,
    /// Log output settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl QuarryConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Io`] if the file cannot be read, or
    /// [`QuarryError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quarry_core::QuarryConfig;
    /// use std::path::Path;
    ///
    /// let config = QuarryConfig::from_file(Path::new(".quarry.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, QuarryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_core::QuarryConfig;
    ///
    /// let toml = r#"
    /// [mining]
    /// save_every = 50
    /// "#;
    /// let config = QuarryConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.mining.save_every, 50);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, QuarryError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Directory where cloned repositories are cached.
    pub fn repos_dir(&self) -> PathBuf {
        self.storage.data_dir.join("repos")
    }

    /// Directory where per-repository result tables are written.
    pub fn results_dir(&self) -> PathBuf {
        self.storage.data_dir.join("results")
    }

    /// Path of the log file, defaulting to `<data_dir>/quarry.log`.
    pub fn log_file(&self) -> PathBuf {
        self.log
            .file
            .clone()
            .unwrap_or_else(|| self.storage.data_dir.join("quarry.log"))
    }
}

/// On-disk layout configuration.
///
/// # Examples
///
/// ```
/// use quarry_core::StorageConfig;
///
/// let config = StorageConfig::default();
/// assert_eq!(config.data_dir.to_str(), Some("data"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for repository caches and results (default: `data`).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// History walking and metric computation settings.
///
/// # Examples
///
/// ```
/// use quarry_core::MiningConfig;
///
/// let config = MiningConfig::default();
/// assert_eq!(config.languages, vec!["python".to_string()]);
/// assert_eq!(config.max_file_kb, 1024);
/// assert!(config.branch.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Branch to walk. When unset, the default branch is resolved from
    /// `main`, `master`, `origin/main`, `origin/master` in that order.
    pub branch: Option<String>,
    /// Languages whose files are analyzed (default: `["python"]`).
    ///
    /// Commits touching no file of these languages are skipped entirely.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Write results to disk every N processed commits (default: 100).
    #[serde(default = "default_save_every")]
    pub save_every: usize,
    /// Skip snapshot files larger than this many KiB (default: 1024).
    #[serde(default = "default_max_file_kb")]
    pub max_file_kb: u64,
}

fn default_languages() -> Vec<String> {
    vec!["python".into()]
}

fn default_save_every() -> usize {
    100
}

fn default_max_file_kb() -> u64 {
    1024
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            branch: None,
            languages: default_languages(),
            save_every: default_save_every(),
            max_file_kb: default_max_file_kb(),
        }
    }
}

/// Log output configuration.
///
/// # Examples
///
/// ```
/// use quarry_core::LogConfig;
///
/// let config = LogConfig::default();
/// assert_eq!(config.level, "info");
/// assert!(config.file.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log file path (default: `<data_dir>/quarry.log`).
    pub file: Option<PathBuf>,
    /// Log level for the file layer (default: `"info"`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = QuarryConfig::default();
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert_eq!(config.mining.languages, vec!["python".to_string()]);
        assert_eq!(config.mining.save_every, 100);
        assert_eq!(config.mining.max_file_kb, 1024);
        assert!(config.mining.branch.is_none());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn derived_paths_follow_data_dir() {
        let mut config = QuarryConfig::default();
        config.storage.data_dir = PathBuf::from("/var/quarry");
        assert_eq!(config.repos_dir(), PathBuf::from("/var/quarry/repos"));
        assert_eq!(config.results_dir(), PathBuf::from("/var/quarry/results"));
        assert_eq!(config.log_file(), PathBuf::from("/var/quarry/quarry.log"));
    }

    #[test]
    fn explicit_log_file_wins() {
        let toml = r#"
[log]
file = "/tmp/custom.log"
"#;
        let config = QuarryConfig::from_toml(toml).unwrap();
        assert_eq!(config.log_file(), PathBuf::from("/tmp/custom.log"));
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[mining]
save_every = 25
languages = ["python", "rust"]
"#;
        let config = QuarryConfig::from_toml(toml).unwrap();
        assert_eq!(config.mining.save_every, 25);
        assert_eq!(
            config.mining.languages,
            vec!["python".to_string(), "rust".to_string()]
        );
        // Untouched sections keep defaults.
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[storage]
data_dir = "scratch"

[mining]
branch = "develop"
languages = ["rust"]
save_every = 10
max_file_kb = 256

[log]
file = "scratch/run.log"
level = "debug"
"#;
        let config = QuarryConfig::from_toml(toml).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("scratch"));
        assert_eq!(config.mining.branch.as_deref(), Some("develop"));
        assert_eq!(config.mining.max_file_kb, 256);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = QuarryConfig::from_toml("").unwrap();
        assert_eq!(config.mining.save_every, 100);
        assert_eq!(config.mining.languages, vec!["python".to_string()]);
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = QuarryConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }
}
