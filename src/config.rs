//! Configuration module for dirpane.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DIRPANE_` and use double underscores
//! to separate nested levels:
//! - `DIRPANE_REFRESH__INTERVAL_MS=250` sets `refresh.interval_ms`
//! - `DIRPANE_HISTORY__MAX_DEPTH=20` sets `history.max_depth`
//! - `DIRPANE_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::ColumnWidths;
use crate::view::ViewLayout;

const ENV_PREFIX: &str = "DIRPANE_";

/// Errors from loading, validating or saving settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },

    #[error("Configuration file already exists at {path}. Use --force to overwrite")]
    AlreadyExists { path: PathBuf },

    #[error("Failed to write configuration to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Live-refresh settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Navigation history settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// View grid dimensions
    #[serde(default)]
    pub grid: GridConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Saved views, restored on startup
    #[serde(default)]
    pub views: Vec<ViewConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RefreshConfig {
    /// Interval of the shared drain cycle in milliseconds
    #[serde(default = "default_refresh_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    /// Maximum number of entries on a view's back stack
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GridConfig {
    #[serde(default = "default_one")]
    pub rows: u32,

    #[serde(default = "default_one")]
    pub columns: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for all modules (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides
    #[serde(default)]
    pub modules: IndexMap<String, String>,

    /// Append logs to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// One saved view: where it sits in the grid, what it shows, how wide its
/// columns are.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ViewConfig {
    /// Grid row, -1 when unplaced
    #[serde(default = "default_unplaced")]
    pub row: i32,

    /// Grid column, -1 when unplaced
    #[serde(default = "default_unplaced")]
    pub column: i32,

    /// Directory the view should load
    #[serde(default = "default_view_directory")]
    pub directory: PathBuf,

    /// Property column widths
    #[serde(default)]
    pub column_widths: ColumnWidths,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_refresh_interval_ms() -> u64 {
    500
}
fn default_max_depth() -> usize {
    crate::history::DEFAULT_MAX_DEPTH
}
fn default_one() -> u32 {
    1
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_unplaced() -> i32 {
    -1
}
fn default_view_directory() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            refresh: RefreshConfig::default(),
            history: HistoryConfig::default(),
            grid: GridConfig::default(),
            logging: LoggingConfig::default(),
            views: Vec::new(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: default_one(),
            columns: default_one(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: IndexMap::new(),
            file: None,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            row: default_unplaced(),
            column: default_unplaced(),
            directory: default_view_directory(),
            column_widths: ColumnWidths::default(),
        }
    }
}

impl ViewConfig {
    /// Saved form of a live view placed at `row`, `column`.
    pub fn from_layout(row: i32, column: i32, layout: ViewLayout) -> Self {
        Self {
            row,
            column,
            directory: layout.directory.unwrap_or_else(default_view_directory),
            column_widths: layout.column_widths,
        }
    }
}

impl Settings {
    /// Default settings file: `<local data dir>/dirpane/settings.toml`.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dirpane")
            .join("settings.toml")
    }

    /// Load configuration from all sources
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings: Settings = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the views cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.rows == 0 {
            return Err(ConfigError::Invalid {
                reason: "grid.rows cannot be less than 1".to_string(),
            });
        }
        if self.grid.columns == 0 {
            return Err(ConfigError::Invalid {
                reason: "grid.columns cannot be less than 1".to_string(),
            });
        }
        if self.refresh.interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "refresh.interval_ms must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let toml_string = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, toml_string).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Create a default settings file at `path`
    pub fn init_config_file(path: impl AsRef<Path>, force: bool) -> Result<PathBuf, ConfigError> {
        let path = path.as_ref();
        if !force && path.exists() {
            return Err(ConfigError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }

        let mut settings = Settings::default();
        settings.views.push(ViewConfig {
            row: 0,
            column: 0,
            ..ViewConfig::default()
        });
        settings.save(path)?;
        Ok(path.to_path_buf())
    }
}
