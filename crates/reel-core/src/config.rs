//! Configuration management for Reel.
//!
//! This module provides configuration loading, saving, and defaults.
//! Configuration is stored in TOML format in a platform-appropriate location.

use crate::error::{ReelError, Result};
use crate::index::DEFAULT_PARALLEL_THRESHOLD;
use crate::search::DEFAULT_GRAM_LEN;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure for Reel.
///
/// ## Example Configuration File (reel.toml)
///
/// ```toml
/// [general]
/// log_level = "info"
/// max_results = 1000
///
/// [index]
/// gram_len = 5
/// parallel_threshold = 10000
///
/// [filter]
/// initial_query = ""
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Inverted index tuning
    pub index: IndexConfig,

    /// Live filter settings
    pub filter: FilterConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Maximum number of search results to display
    pub max_results: usize,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            max_results: 1000,
            log_level: "info".to_string(),
        }
    }
}

/// Index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Window length for terms long enough to be split
    pub gram_len: usize,

    /// Bulk adds larger than this derive tokens in parallel
    pub parallel_threshold: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            gram_len: DEFAULT_GRAM_LEN,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Live filter configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FilterConfig {
    /// Query a new filter starts with
    pub initial_query: String,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| ReelError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Saving configuration");
        let contents = toml::to_string_pretty(self).map_err(|e| ReelError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "reel").ok_or_else(|| ReelError::ConfigError {
            reason: "Could not determine config directory".to_string(),
        })?;

        Ok(dirs.config_dir().join("reel.toml"))
    }

    /// Reject settings the index cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.index.gram_len == 0 {
            return Err(ReelError::ConfigError {
                reason: "index.gram_len must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
