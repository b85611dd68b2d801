//! Configuration module for twinsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Suffix of the temporary files written while copying
pub const TEMP_SUFFIX: &str = ".twinsync-tmp";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for twinsync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
    pub store: StoreConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Chunk size (bytes) for checksum and copy streaming.
    pub buffer_size: usize,
    /// Whether deletes performed by a resolution go to the trash.
    pub recoverable_delete: bool,
    /// How many temporary names a copy probes before giving up.
    pub temp_name_attempts: u32,
    /// Glob patterns; matching names are skipped by the tree walk.
    pub exclude: Vec<String>,
    /// Trash location; the XDG trash when unset.
    pub trash_dir: Option<PathBuf>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Partnership store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the JSON file holding every partnership and its ledger.
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/twinsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("twinsync")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            buffer_size: 2 * 1024 * 1024,
            recoverable_delete: true,
            temp_name_attempts: 100,
            exclude: vec![format!("*{TEMP_SUFFIX}")],
            trash_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("twinsync")
                .join("partnerships.json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.buffer_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if self.sync.buffer_size == 0 {
            errors.push(ValidationError {
                field: "sync.buffer_size".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.temp_name_attempts == 0 {
            errors.push(ValidationError {
                field: "sync.temp_name_attempts".into(),
                message: "must be greater than 0".into(),
            });
        }
        for (i, pattern) in self.sync.exclude.iter().enumerate() {
            if pattern.trim().is_empty() {
                errors.push(ValidationError {
                    field: format!("sync.exclude[{i}]"),
                    message: "pattern must not be empty".into(),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- store ---
        if self.store.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "store.path".into(),
                message: "must not be empty".into(),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use twinsync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .sync_buffer_size(64 * 1024)
///     .logging_level("debug")
///     .build();
/// assert_eq!(config.sync.buffer_size, 64 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn sync_buffer_size(mut self, bytes: usize) -> Self {
        self.config.sync.buffer_size = bytes;
        self
    }

    pub fn sync_recoverable_delete(mut self, recoverable: bool) -> Self {
        self.config.sync.recoverable_delete = recoverable;
        self
    }

    pub fn sync_temp_name_attempts(mut self, attempts: u32) -> Self {
        self.config.sync.temp_name_attempts = attempts;
        self
    }

    pub fn sync_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.config.sync.exclude.push(pattern.into());
        self
    }

    pub fn sync_trash_dir(mut self, dir: PathBuf) -> Self {
        self.config.sync.trash_dir = Some(dir);
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- store ---

    pub fn store_path(mut self, path: PathBuf) -> Self {
        self.config.store.path = path;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
