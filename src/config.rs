//! Application configuration
//!
//! Settings come from built-in defaults, then an optional TOML file
//! (`~/.config/gamedex/config.toml` on Linux), then environment variables.

use chrono::Duration;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::DEFAULT_TTL_DAYS;
use crate::user::DEFAULT_HISTORY_CAP;

/// Base URL of the RAWG catalog API
pub const DEFAULT_API_BASE_URL: &str = "https://api.rawg.io/api";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "RAWG_API_KEY";

/// Environment variable overriding the cache TTL, in hours
pub const CACHE_TTL_ENV: &str = "GAMEDEX_CACHE_TTL_HOURS";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for `Config`
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    /// The cache TTL does not fit in a duration
    #[error("Cache TTL of {0} hours is out of range")]
    TtlOutOfRange(u64),
}

/// Tunables for the cache, the user store and the API client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long cached API responses stay fresh, in hours
    pub cache_ttl_hours: u64,
    /// How many recently viewed games are kept
    pub history_cap: usize,
    /// Catalog API base URL
    pub api_base_url: String,
    /// Catalog API key
    pub api_key: Option<String>,
    /// Root directory for cache and user data, instead of the XDG locations
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_hours: DEFAULT_TTL_DAYS as u64 * 24,
            history_cap: DEFAULT_HISTORY_CAP,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            data_dir: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "gamedex")
}

impl Config {
    /// Default location of the config file, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from `path`, or from the default location
    ///
    /// A missing file at the default location is not an error; an explicitly
    /// given `path` must exist. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.with_env(|var| std::env::var(var).ok())
    }

    /// Parses a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.cache_ttl()?;
        Ok(config)
    }

    /// Applies environment overrides looked up through `var`
    pub fn with_env<F>(mut self, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var(API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(value) = var(CACHE_TTL_ENV) {
            self.cache_ttl_hours = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: CACHE_TTL_ENV,
                value,
            })?;
        }
        self.cache_ttl()?;
        Ok(self)
    }

    /// Cache TTL as a duration
    pub fn cache_ttl(&self) -> Result<Duration, ConfigError> {
        i64::try_from(self.cache_ttl_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or(ConfigError::TtlOutOfRange(self.cache_ttl_hours))
    }

    /// Directory for cached API responses
    ///
    /// `<data_dir>/cache` when a data directory is configured, otherwise the
    /// XDG cache directory (`~/.cache/gamedex/` on Linux).
    pub fn cache_dir(&self) -> Option<PathBuf> {
        match &self.data_dir {
            Some(dir) => Some(dir.join("cache")),
            None => project_dirs().map(|dirs| dirs.cache_dir().to_path_buf()),
        }
    }

    /// Directory for the profile, favorites and history records
    pub fn user_dir(&self) -> Option<PathBuf> {
        match &self.data_dir {
            Some(dir) => Some(dir.clone()),
            None => project_dirs().map(|dirs| dirs.data_dir().to_path_buf()),
        }
    }
}
